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

//! Data source references embedded in dashboards.
//!
//! A panel, target or templating variable binds to a data source through a
//! `datasource` field holding either a bare identifier or an object with a
//! `uid`. Built-in pseudo sources and `$variables` are not references.

use crate::walker::{objects, walk_mut};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

pub const BINDING_FIELD: &str = "datasource";
const UID_FIELD: &str = "uid";
const VARIABLE_SIGIL: char = '$';
const BUILTIN_SOURCES: [&str; 4] = ["grafana", "-- Grafana --", "-- Mixed --", "-- Dashboard --"];

/// Identifier carried by a binding value, whichever form it takes.
fn binding_id(binding: &Value) -> Option<&str> {
    match binding {
        Value::String(id) => Some(id),
        Value::Object(map) => map.get(UID_FIELD).and_then(Value::as_str),
        _ => None,
    }
}

fn is_concrete(id: &str) -> bool {
    !id.is_empty() && !id.starts_with(VARIABLE_SIGIL) && !BUILTIN_SOURCES.contains(&id)
}

/// Distinct concrete data source identifiers used anywhere in `document`.
pub fn discover(document: &Value) -> BTreeSet<String> {
    objects(document)
        .filter_map(|obj| obj.get(BINDING_FIELD))
        .filter_map(binding_id)
        .filter(|id| is_concrete(id))
        .map(str::to_string)
        .collect()
}

/// Rewrites binding identifiers found in `replacements`, leaving every other
/// string in the document untouched. Returns how many bindings changed.
pub fn rewrite_bindings(document: &mut Value, replacements: &HashMap<String, String>) -> usize {
    let mut rewritten = 0;
    walk_mut(document, &mut |node| {
        let Some(binding) = node.as_object_mut().and_then(|o| o.get_mut(BINDING_FIELD)) else {
            return;
        };
        let slot = if binding.is_string() {
            Some(binding)
        } else {
            binding
                .as_object_mut()
                .and_then(|map| map.get_mut(UID_FIELD))
                .filter(|v| v.is_string())
        };
        if let Some(slot) = slot
            && let Some(new) = slot.as_str().and_then(|id| replacements.get(id))
        {
            *slot = Value::String(new.clone());
            rewritten += 1;
        }
    });
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn planted() -> Value {
        json!({
            "title": "Planted",
            "datasource": "depth-one",
            "panels": [
                {"type": "row", "panels": [
                    {"targets": [{"datasource": {"type": "loki", "uid": "depth-three"}}]}
                ]},
                {"datasource": {"type": "prometheus", "uid": "in-array"}},
                {"datasource": ""},
                {"datasource": "grafana"},
                {"datasource": {"uid": "-- Mixed --"}},
                {"datasource": "${DS_PROM}"},
                {"datasource": {"uid": "$datasource"}},
                {"datasource": null}
            ],
            "templating": {"list": [
                {"type": "query", "datasource": {"uid": "in-array"}}
            ]}
        })
    }

    #[test]
    fn discovers_references_at_any_depth_and_skips_non_references() {
        let found = discover(&planted());
        let expected: BTreeSet<String> = ["depth-one", "depth-three", "in-array"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn rewrite_touches_only_binding_positions() {
        let mut doc = json!({
            "panels": [
                {"datasource": "ab", "description": "ab", "targets": [{"expr": "ab"}]},
                {"datasource": {"type": "prometheus", "uid": "abc"}}
            ]
        });
        let replacements = HashMap::from([
            ("ab".to_string(), "${DS_A}".to_string()),
            ("abc".to_string(), "${DS_B}".to_string()),
        ]);

        let count = rewrite_bindings(&mut doc, &replacements);

        assert_eq!(count, 2);
        assert_eq!(
            doc,
            json!({
                "panels": [
                    {"datasource": "${DS_A}", "description": "ab", "targets": [{"expr": "ab"}]},
                    {"datasource": {"type": "prometheus", "uid": "${DS_B}"}}
                ]
            })
        );
    }
}
