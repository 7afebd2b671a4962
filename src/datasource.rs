// grafctl - CLI for the Grafana HTTP API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::client::{ApiClient, ResponseData};
use crate::edit::{EditSession, Editor, Outcome};
use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};

/// Flags accepted by `ds create` when no file is given.
#[derive(Debug, Clone)]
pub struct NewDatasource {
    pub name: String,
    pub plugin_type: String,
    pub url: String,
    pub access: String,
    pub basic_auth: bool,
}

impl NewDatasource {
    pub fn payload(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.plugin_type,
            "url": self.url,
            "access": self.access,
            "basicAuth": self.basic_auth,
        })
    }
}

fn item_path(id: i64) -> String {
    format!("/api/datasources/{id}")
}

pub fn read(client: &ApiClient, id_or_name: &str) -> Result<ResponseData> {
    let source = client.find_datasource(id_or_name)?;
    let response = client
        .get(&item_path(source.id), &[])?
        .ensure_success("reading datasource")?;
    Ok(response)
}

pub fn remove(client: &ApiClient, id_or_name: &str) -> Result<ResponseData> {
    let source = client.find_datasource(id_or_name)?;
    tracing::info!(id = source.id, name = %source.name, "deleting datasource");
    let response = client
        .delete(&item_path(source.id))?
        .ensure_success("deleting datasource")?;
    Ok(response)
}

/// A numeric `id` inside the document wins over the command-line argument.
pub fn update_from_document(
    client: &ApiClient,
    document: Map<String, Value>,
    id_or_name: Option<&str>,
) -> Result<ResponseData> {
    let id = match document.get("id") {
        Some(Value::Number(n)) => n.as_i64().filter(|id| *id > 0),
        Some(Value::Null) | None => None,
        Some(_) => return Err(anyhow!("`id` in the datasource document must be a number")),
    };
    let id = match (id, id_or_name) {
        (Some(id), _) => id,
        (None, Some(arg)) => client.find_datasource(arg)?.id,
        (None, None) => {
            return Err(anyhow!(
                "cannot determine datasource id from the document or arguments"
            ));
        }
    };

    let response = client
        .put_json(&item_path(id), &document)?
        .ensure_success("updating datasource")?;
    Ok(response)
}

/// Opens the current definition in the editor and PUTs it back until the
/// server accepts it.
pub fn update_interactive<E: Editor>(
    client: &ApiClient,
    id_or_name: &str,
    editor: E,
) -> Result<Outcome> {
    let id = client.find_datasource(id_or_name)?.id;
    let current = client
        .get(&item_path(id), &[])?
        .ensure_success("reading datasource")?;
    let document: Value = current
        .json
        .context("datasource response is not JSON")?;
    let content = serde_json::to_string_pretty(&document)?;

    let mut session = EditSession::new(editor, content);
    session.run(|edited| client.put_json(&item_path(id), &edited))
}
