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

//! Depth-first traversal over `serde_json::Value` trees.
//!
//! Two modes are offered: [`walk`] is a lazy, read-only iterator used to
//! collect observations, and [`walk_mut`] hands every node to a visitor that
//! may rewrite it in place. JSON values are trees, so every node is reached
//! exactly once.

use serde_json::{Map, Value};

/// Lazy pre-order iterator over a value and all of its descendants.
pub struct Walk<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        match node {
            Value::Object(map) => self.stack.extend(map.values().rev()),
            Value::Array(items) => self.stack.extend(items.iter().rev()),
            _ => {}
        }
        Some(node)
    }
}

pub fn walk(value: &Value) -> Walk<'_> {
    Walk { stack: vec![value] }
}

/// Every object in the tree, the root included.
pub fn objects(value: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    walk(value).filter_map(Value::as_object)
}

/// Visits `value` and then its children. The visitor may replace or mutate
/// the node it receives; traversal descends into whatever it left behind.
pub fn walk_mut<F>(value: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Value),
{
    visit(value);
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                walk_mut(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                walk_mut(child, visit);
            }
        }
        _ => {}
    }
}

/// Replaces scalar nodes for which `replace` returns a value. Containers are
/// never handed to `replace`.
pub fn rewrite_scalars<F>(value: &mut Value, mut replace: F) -> usize
where
    F: FnMut(&Value) -> Option<Value>,
{
    let mut replaced = 0;
    walk_mut(value, &mut |node| {
        if node.is_object() || node.is_array() {
            return;
        }
        if let Some(new) = replace(node) {
            *node = new;
            replaced += 1;
        }
    });
    replaced
}
