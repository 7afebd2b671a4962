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

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub active: Option<String>,
    pub active_org: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub url: String,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error("no active profile set; use `grafctl config use <name>` first")]
    NoActiveProfile,
    #[error("profile `{0}` does not exist")]
    UnknownProfile(String),
}

/// Everything a request needs to know about where it goes and who sends it.
///
/// Resolved once per invocation and handed to the client, so nothing below
/// `main` reads the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveContext {
    pub profile: Profile,
    pub org_id: Option<String>,
}

impl Config {
    pub fn upsert_profile(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".grafctl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var("GRAFCTL_CONFIG_DIR") {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("grafctl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    restrict_permissions(&path)?;
    tracing::debug!(path = %path.display(), "saved config");
    Ok(path)
}

pub fn resolve(
    cwd: &Path,
    profile_override: Option<String>,
    org_override: Option<String>,
) -> Result<ActiveContext> {
    let merged = load(cwd)?;
    resolve_from(merged, profile_override, org_override)
}

fn resolve_from(
    mut merged: Config,
    profile_override: Option<String>,
    org_override: Option<String>,
) -> Result<ActiveContext> {
    let name = profile_override
        .or(merged.active.take())
        .ok_or(ConfigError::NoActiveProfile)?;
    let mut profile = merged
        .profiles
        .remove(&name)
        .ok_or_else(|| ConfigError::UnknownProfile(name.clone()))?;
    profile.url = profile.url.trim_end_matches('/').to_string();

    let org_id = org_override
        .or(merged.active_org)
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());

    Ok(ActiveContext { profile, org_id })
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: Config, local: Config) -> Config {
    let mut profiles = user.profiles;
    profiles.extend(local.profiles);
    Config {
        active: local.active.or(user.active),
        active_org: local.active_org.or(user.active_org),
        profiles,
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting permissions on {:?}", path))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::{env, fs};
    use tempfile::tempdir;

    static ENV_LOCK: OnceLock<std::sync::Mutex<()>> = OnceLock::new();

    fn profile(name: &str, url: &str) -> Profile {
        Profile {
            name: name.into(),
            url: url.into(),
            user: "admin".into(),
            pass: "admin".into(),
        }
    }

    #[test]
    fn merges_user_and_local_and_overrides() {
        let _guard = ENV_LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .unwrap();
        let cwd = tempdir().unwrap();
        unsafe {
            env::set_var("GRAFCTL_CONFIG_DIR", cwd.path().join("config"));
        }
        fs::create_dir_all(cwd.path().join("config")).unwrap();

        let mut user_cfg = Config::default();
        user_cfg.upsert_profile(profile("prod", "https://grafana.example.test/"));
        user_cfg.upsert_profile(profile("staging", "https://staging.example.test"));
        user_cfg.set_active("prod").unwrap();
        user_cfg.active_org = Some("1".into());
        save(Scope::User, &user_cfg, cwd.path()).unwrap();

        let local_cfg = Config {
            active: Some("staging".into()),
            active_org: None,
            profiles: BTreeMap::new(),
        };
        save(Scope::Local, &local_cfg, cwd.path()).unwrap();

        let ctx = resolve(cwd.path(), None, None).unwrap();
        assert_eq!(ctx.profile.name, "staging");
        assert_eq!(ctx.org_id.as_deref(), Some("1"));

        let overridden = resolve(cwd.path(), Some("prod".into()), Some("7".into())).unwrap();
        assert_eq!(overridden.profile.url, "https://grafana.example.test");
        assert_eq!(overridden.org_id.as_deref(), Some("7"));
    }

    #[test]
    fn errors_when_no_profile_selected() {
        let _guard = ENV_LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .unwrap();
        let cwd = tempdir().unwrap();
        unsafe {
            env::set_var("GRAFCTL_CONFIG_DIR", cwd.path().join("config"));
        }
        let err = resolve(cwd.path(), None, None).unwrap_err();
        assert!(err.to_string().contains("no active profile set"));
    }

    #[test]
    fn set_active_rejects_unknown_profile() {
        let mut cfg = Config::default();
        cfg.upsert_profile(profile("prod", "http://localhost:3000"));
        assert!(matches!(
            cfg.set_active("dev"),
            Err(ConfigError::UnknownProfile(name)) if name == "dev"
        ));
        assert!(cfg.active.is_none());
    }

    #[test]
    fn blank_org_is_treated_as_unscoped() {
        let mut cfg = Config::default();
        cfg.upsert_profile(profile("prod", "http://localhost:3000"));
        cfg.set_active("prod").unwrap();
        cfg.active_org = Some("  ".into());
        let ctx = resolve_from(cfg, None, None).unwrap();
        assert_eq!(ctx.org_id, None);
    }
}
