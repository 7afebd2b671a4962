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

//! Portable dashboard templates.
//!
//! Exporting replaces every concrete data source binding with a `${NAME}`
//! placeholder and declares one input per data source, so the dashboard can
//! be imported on a server whose data sources have different identifiers.
//! Importing is the inverse and lives in [`crate::resolve`].

use crate::models::DataSource;
use crate::prompt::PromptError;
use crate::reference::{discover, rewrite_bindings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

pub const DATASOURCE_INPUT: &str = "datasource";
const CONSTANT_INPUT: &str = "constant";
const INPUT_PREFIX: &str = "DS_";
const PLUGIN_VERSION: &str = "1.0.0";
const INSTANCE_FIELDS: [&str; 3] = ["id", "uid", "version"];

/// An externally supplied value the template needs before it can be created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    /// Pre-filled value of `constant` inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl TemplateInput {
    pub fn placeholder(&self) -> String {
        placeholder(&self.name)
    }

    pub fn is_datasource(&self) -> bool {
        self.kind == DATASOURCE_INPUT
    }

    pub fn is_constant(&self) -> bool {
        self.kind == CONSTANT_INPUT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateRequirement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl TemplateRequirement {
    pub fn platform() -> Self {
        Self {
            kind: "grafana".into(),
            id: "grafana".into(),
            name: "Grafana".into(),
            version: PLUGIN_VERSION.into(),
        }
    }

    fn datasource_plugin(source: &DataSource) -> Self {
        Self {
            kind: DATASOURCE_INPUT.into(),
            id: source.plugin_type.clone(),
            name: source
                .type_name
                .clone()
                .unwrap_or_else(|| source.plugin_type.clone()),
            version: PLUGIN_VERSION.into(),
        }
    }
}

/// File format shared by `dash read --external` and `dash create --file`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    #[serde(rename = "__inputs", default)]
    pub inputs: Vec<TemplateInput>,
    #[serde(rename = "__requires", default)]
    pub requires: Vec<TemplateRequirement>,
    #[serde(flatten)]
    pub dashboard: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("datasource `{0}` is referenced by the dashboard but missing from the catalog")]
    UnknownDatasource(String),
    #[error(
        "datasources `{first}` and `{second}` both map to input name {name}; rename one of them before exporting"
    )]
    InputNameCollision {
        name: String,
        first: String,
        second: String,
    },
    #[error("no datasources found for type {plugin_id} (needed by input {input})")]
    NoCandidates { input: String, plugin_id: String },
    #[error("input {name} of type `{kind}` cannot be resolved")]
    UnsupportedInput { name: String, kind: String },
    #[error("invalid dashboard JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// `DS_` followed by the upper-cased display name, with every run of
/// characters other than ASCII letters and digits collapsed to one `_`.
pub fn input_name(display_name: &str) -> String {
    let mut name = String::from(INPUT_PREFIX);
    let mut pending_separator = false;
    for ch in display_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && name.len() > INPUT_PREFIX.len() {
                name.push('_');
            }
            pending_separator = false;
            name.push(ch.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
    }
    name
}

/// Builds a template from a concrete dashboard and the references found in it.
///
/// `lookup` maps a reference to its catalog entry. Unknown references and
/// data sources whose input names coincide are errors: either would leave a
/// concrete identifier behind or drop an input.
pub fn extract<'c, F>(
    dashboard: Map<String, Value>,
    references: &BTreeSet<String>,
    lookup: F,
) -> Result<Template, TemplateError>
where
    F: Fn(&str) -> Option<&'c DataSource>,
{
    let mut inputs: Vec<TemplateInput> = Vec::new();
    let mut requires = vec![TemplateRequirement::platform()];
    let mut owners: HashMap<String, &DataSource> = HashMap::new();
    let mut replacements: HashMap<String, String> = HashMap::new();

    for reference in references {
        let source =
            lookup(reference).ok_or_else(|| TemplateError::UnknownDatasource(reference.clone()))?;
        let name = input_name(&source.name);

        match owners.get(&name) {
            Some(owner) if owner.uid == source.uid => {}
            Some(owner) => {
                return Err(TemplateError::InputNameCollision {
                    name,
                    first: owner.name.clone(),
                    second: source.name.clone(),
                });
            }
            None => {
                owners.insert(name.clone(), source);
                inputs.push(TemplateInput {
                    name: name.clone(),
                    label: source.name.clone(),
                    kind: DATASOURCE_INPUT.into(),
                    plugin_id: Some(source.plugin_type.clone()),
                    value: None,
                });
                if !requires
                    .iter()
                    .any(|r| r.kind == DATASOURCE_INPUT && r.id == source.plugin_type)
                {
                    requires.push(TemplateRequirement::datasource_plugin(source));
                }
            }
        }
        replacements.insert(reference.clone(), placeholder(&name));
    }

    let mut document = Value::Object(dashboard);
    let rewritten = rewrite_bindings(&mut document, &replacements);
    tracing::debug!(
        references = references.len(),
        inputs = inputs.len(),
        rewritten,
        "extracted template"
    );

    let Value::Object(mut dashboard) = document else {
        unreachable!("rewriting keeps the root an object");
    };
    for field in INSTANCE_FIELDS {
        dashboard.remove(field);
    }

    Ok(Template {
        inputs,
        requires,
        dashboard,
    })
}

/// Discovers references in `dashboard` and extracts a template, matching
/// each reference against the catalog by uid first and display name second.
pub fn export(
    dashboard: Map<String, Value>,
    catalog: &[DataSource],
) -> Result<Template, TemplateError> {
    let references = discover(&Value::Object(dashboard.clone()));
    extract(dashboard, &references, |reference| {
        catalog
            .iter()
            .find(|d| d.uid == reference)
            .or_else(|| catalog.iter().find(|d| d.name == reference))
    })
}

impl Template {
    pub fn parse(raw: &[u8]) -> Result<Self, TemplateError> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn needs_catalog(&self) -> bool {
        self.inputs.iter().any(TemplateInput::is_datasource)
    }
}
