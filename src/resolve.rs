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

//! Turning a template back into a concrete dashboard at import time.

use crate::models::DataSource;
use crate::prompt::Prompter;
use crate::template::{Template, TemplateError, TemplateInput};
use crate::walker::rewrite_scalars;
use serde_json::{Map, Value};
use std::collections::HashMap;

enum Pending<'c> {
    Pick(String, Vec<&'c DataSource>),
    Fixed(Value),
}

/// Collects a value for every declared input, then substitutes each
/// placeholder with it.
///
/// Placeholders are replaced where a whole JSON string equals `${NAME}`, so
/// text that merely contains the expression is left alone. The returned
/// document carries no `__inputs`/`__requires` declarations.
pub fn resolve(
    template: Template,
    catalog: &[DataSource],
    prompter: &mut dyn Prompter,
) -> Result<Map<String, Value>, TemplateError> {
    // Every input is checked against the catalog before the operator is asked
    // anything, so a missing plugin fails without wasted prompts.
    let mut pending: Vec<(&TemplateInput, Pending)> = Vec::with_capacity(template.inputs.len());
    for input in &template.inputs {
        let plan = if input.is_datasource() {
            let plugin_id = input.plugin_id.clone().unwrap_or_default();
            let candidates: Vec<&DataSource> = catalog
                .iter()
                .filter(|d| d.plugin_type == plugin_id)
                .collect();
            if candidates.is_empty() {
                return Err(TemplateError::NoCandidates {
                    input: input.name.clone(),
                    plugin_id,
                });
            }
            Pending::Pick(plugin_id, candidates)
        } else if let Some(value) = input.value.clone().filter(|_| input.is_constant()) {
            Pending::Fixed(value)
        } else {
            return Err(TemplateError::UnsupportedInput {
                name: input.name.clone(),
                kind: input.kind.clone(),
            });
        };
        pending.push((input, plan));
    }

    let mut mapping: HashMap<String, Value> = HashMap::new();
    for (input, plan) in pending {
        let value = match plan {
            Pending::Fixed(value) => value,
            Pending::Pick(plugin_id, candidates) => {
                let options: Vec<String> = candidates
                    .iter()
                    .map(|d| format!("{} (UID: {})", d.name, d.uid))
                    .collect();
                let title = format!(
                    "Select datasource for '{}' ({}, plugin: {})",
                    input.label, input.name, plugin_id
                );
                let choice = prompter.select(&title, &options)?;
                Value::String(candidates[choice].uid.clone())
            }
        };
        tracing::debug!(input = %input.name, %value, "resolved template input");
        mapping.insert(input.placeholder(), value);
    }

    let mut document = Value::Object(template.dashboard);
    let replaced = rewrite_scalars(&mut document, |node| {
        node.as_str().and_then(|s| mapping.get(s)).cloned()
    });
    tracing::debug!(replaced, "substituted template placeholders");

    let Value::Object(dashboard) = document else {
        unreachable!("substitution keeps the root an object");
    };
    Ok(dashboard)
}

/// Lets the operator rename the dashboard and pick its uid before creation.
/// An empty uid answer leaves uid assignment to the server.
pub fn prompt_overrides(
    dashboard: &mut Map<String, Value>,
    prompter: &mut dyn Prompter,
) -> Result<(), TemplateError> {
    let title = dashboard
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if prompter.confirm(&format!("Change title? (current: {title})"))? {
        let new_title = prompter.ask("Enter new title")?;
        if !new_title.is_empty() {
            dashboard.insert("title".into(), Value::String(new_title));
        }
    }

    let uid = dashboard
        .get("uid")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .unwrap_or("(none, will be auto-generated)")
        .to_string();
    if prompter.confirm(&format!("Change UID? (current: {uid})"))? {
        let new_uid = prompter.ask("Enter new UID")?;
        if new_uid.is_empty() {
            dashboard.remove("uid");
        } else {
            dashboard.insert("uid".into(), Value::String(new_uid));
        }
    }
    Ok(())
}
