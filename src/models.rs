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

//! Wire types for the parts of the Grafana API that are read structurally.
//!
//! Dashboards themselves stay untyped (`serde_json::Value`); only the
//! envelopes around them and the catalog entries are modelled here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of `GET /api/datasources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSource {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    pub name: String,
    /// Plugin id, e.g. `prometheus`
    #[serde(rename = "type")]
    pub plugin_type: String,
    #[serde(rename = "typeName", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl DataSource {
    /// Accepts the numeric id, the uid or the display name.
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.id.to_string() == id_or_name || self.uid == id_or_name || self.name == id_or_name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Org {
    pub id: i64,
    pub name: String,
}

impl Org {
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.id.to_string() == id_or_name || self.name == id_or_name
    }
}

/// Response of `GET /api/dashboards/uid/{uid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardEnvelope {
    pub dashboard: Map<String, Value>,
    #[serde(default)]
    pub meta: DashboardMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMeta {
    #[serde(default)]
    pub folder_uid: Option<String>,
}

/// One entry of `GET /api/search?type=dash-db`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub uid: String,
    pub title: String,
    #[serde(default)]
    pub folder_title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SearchHit {
    /// Dashboards outside any folder live in "General".
    pub fn folder(&self) -> &str {
        self.folder_title
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or("General")
    }
}

/// Body of `POST /api/dashboards/db`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveDashboard {
    pub dashboard: Map<String, Value>,
    pub overwrite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
}
