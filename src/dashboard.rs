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

//! Dashboard workflows that take more than one request: portable export,
//! template import and the interactive update loop.

use crate::client::{DashboardStore, DatasourceCatalog, ResponseData};
use crate::edit::{EditSession, Editor, Outcome};
use crate::models::SaveDashboard;
use crate::prompt::Prompter;
use crate::resolve::{prompt_overrides, resolve};
use crate::template::{self, Template};
use anyhow::{Context, Result};

/// `dash read --external`
pub fn export(
    store: &dyn DashboardStore,
    catalog: &dyn DatasourceCatalog,
    uid: &str,
) -> Result<Template> {
    let envelope = store.dashboard(uid)?;
    let sources = catalog
        .datasources()
        .context("fetching datasources for export")?;
    let exported = template::export(envelope.dashboard, &sources)
        .with_context(|| format!("exporting dashboard {uid}"))?;
    tracing::info!(uid, inputs = exported.inputs.len(), "exported dashboard");
    Ok(exported)
}

/// `dash create --file`. The catalog is only fetched when the template
/// declares data source inputs.
pub fn create(
    template: Template,
    store: &dyn DashboardStore,
    catalog: &dyn DatasourceCatalog,
    prompter: &mut dyn Prompter,
) -> Result<ResponseData> {
    let sources = if template.needs_catalog() {
        catalog
            .datasources()
            .context("fetching datasources for input mapping")?
    } else {
        Vec::new()
    };

    let mut dashboard = resolve(template, &sources, prompter)?;
    prompt_overrides(&mut dashboard, prompter)?;

    let payload = SaveDashboard {
        dashboard,
        overwrite: false,
        folder_uid: None,
    };
    let response = store
        .save_dashboard(&payload)?
        .ensure_success("creating dashboard")?;
    Ok(response)
}

/// `dash update`. Edits are resubmitted to the dashboard's current folder.
pub fn update<E: Editor>(store: &dyn DashboardStore, uid: &str, editor: E) -> Result<Outcome> {
    let envelope = store.dashboard(uid)?;
    let folder_uid = envelope.meta.folder_uid.filter(|f| !f.is_empty());
    let content = serde_json::to_string_pretty(&envelope.dashboard)?;

    let mut session = EditSession::new(editor, content);
    session.run(|dashboard| {
        store.save_dashboard(&SaveDashboard {
            dashboard,
            overwrite: true,
            folder_uid: folder_uid.clone(),
        })
    })
}
