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

//! Process exit codes, so scripts can tell failure kinds apart.
//!
//! The message itself is anyhow's Display; only the category lives here.

use crate::client::ApiError;
use crate::config::ConfigError;
use crate::template::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Missing or invalid profile/config.
    ConfigError = 2,
    /// Connection, DNS or TLS failure. Nothing reached the server.
    TransportError = 3,
    /// The server answered with a non-2xx status.
    ServerError = 4,
    /// A document (file, edit buffer or response body) is not the expected JSON.
    MalformedContent = 5,
    /// A name, organization or data source could not be resolved.
    ResolutionFailed = 6,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&ApiError> for ExitCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Transport { .. } => ExitCode::TransportError,
            ApiError::Status { .. } => ExitCode::ServerError,
            ApiError::NotFound { .. } => ExitCode::ResolutionFailed,
        }
    }
}

impl From<&TemplateError> for ExitCode {
    fn from(err: &TemplateError) -> Self {
        match err {
            TemplateError::UnknownDatasource(_)
            | TemplateError::InputNameCollision { .. }
            | TemplateError::NoCandidates { .. }
            | TemplateError::UnsupportedInput { .. } => ExitCode::ResolutionFailed,
            TemplateError::Malformed(_) => ExitCode::MalformedContent,
            TemplateError::Prompt(_) => ExitCode::GeneralError,
        }
    }
}

pub trait ExitCodeExt {
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    /// The first cause in the chain with a known category wins.
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if cause.downcast_ref::<ConfigError>().is_some() {
                return ExitCode::ConfigError;
            }
            if let Some(err) = cause.downcast_ref::<ApiError>() {
                return ExitCode::from(err);
            }
            if let Some(err) = cause.downcast_ref::<TemplateError>() {
                return ExitCode::from(err);
            }
            if cause.downcast_ref::<serde_json::Error>().is_some() {
                return ExitCode::MalformedContent;
            }
            if cause.downcast_ref::<reqwest::Error>().is_some() {
                return ExitCode::TransportError;
            }
        }
        ExitCode::GeneralError
    }
}
