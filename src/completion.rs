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

//! Installing completion scripts into bash and zsh startup files.
//!
//! The script is written to `~/.grafctl/completion/grafctl.<shell>` and
//! sourced from `~/.<shell>rc` below a marker line. Both directions are
//! idempotent.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MARKER: &str = "# grafctl completion";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RcShell {
    Bash,
    Zsh,
}

impl RcShell {
    pub fn name(self) -> &'static str {
        match self {
            RcShell::Bash => "bash",
            RcShell::Zsh => "zsh",
        }
    }

    fn from_hint(hint: &str) -> Option<Self> {
        if hint.contains("zsh") {
            Some(RcShell::Zsh)
        } else if hint.contains("bash") {
            Some(RcShell::Bash)
        } else {
            None
        }
    }
}

/// `$SHELL` first, then the name of the parent process.
pub fn detect_shell() -> Option<RcShell> {
    std::env::var("SHELL")
        .ok()
        .and_then(|shell| RcShell::from_hint(&shell))
        .or_else(|| parent_command().and_then(|comm| RcShell::from_hint(&comm)))
}

#[cfg(unix)]
fn parent_command() -> Option<String> {
    let ppid = std::os::unix::process::parent_id();
    let output = std::process::Command::new("ps")
        .args(["-p", &ppid.to_string(), "-o", "comm="])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(not(unix))]
fn parent_command() -> Option<String> {
    None
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("unable to determine home directory"))
}

#[derive(Debug, Clone)]
pub struct Install {
    home: PathBuf,
    shell: RcShell,
}

impl Install {
    pub fn new(home: impl Into<PathBuf>, shell: RcShell) -> Self {
        Self {
            home: home.into(),
            shell,
        }
    }

    pub fn rc_file(&self) -> PathBuf {
        self.home.join(format!(".{}rc", self.shell.name()))
    }

    pub fn script_file(&self) -> PathBuf {
        self.home
            .join(".grafctl")
            .join("completion")
            .join(format!("grafctl.{}", self.shell.name()))
    }

    fn source_line(&self) -> String {
        let script = self.script_file();
        match self.shell {
            RcShell::Bash => format!("source {}", script.display()),
            RcShell::Zsh => format!("[[ -f {0} ]] && source {0}", script.display()),
        }
    }

    /// Writes `script` and appends the sourcing block unless the rc file
    /// already mentions it.
    pub fn install(&self, script: &[u8]) -> Result<()> {
        let script_file = self.script_file();
        if let Some(dir) = script_file.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&script_file, script)
            .with_context(|| format!("writing {}", script_file.display()))?;

        let rc = self.rc_file();
        let current = read_optional(&rc)?;
        let script_ref = script_file.display().to_string();
        if current.contains(&script_ref) {
            tracing::debug!(rc = %rc.display(), "completion already sourced");
            return Ok(());
        }

        let mut updated = current;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        if !updated.is_empty() {
            updated.push('\n');
        }
        updated.push_str(MARKER);
        updated.push('\n');
        updated.push_str(&self.source_line());
        updated.push('\n');
        fs::write(&rc, updated).with_context(|| format!("writing {}", rc.display()))?;
        tracing::info!(rc = %rc.display(), "added completion to shell profile");
        Ok(())
    }

    /// Removes the script and the sourcing block. Returns whether the rc
    /// file changed.
    pub fn uninstall(&self) -> Result<bool> {
        let script_file = self.script_file();
        match fs::remove_file(&script_file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("removing {}", script_file.display()));
            }
        }

        let rc = self.rc_file();
        let current = read_optional(&rc)?;
        let script_ref = script_file.display().to_string();
        let kept: Vec<&str> = current
            .lines()
            .filter(|line| line.trim() != MARKER && !line.contains(&script_ref))
            .collect();
        if kept.len() == current.lines().count() {
            return Ok(false);
        }

        let mut updated = kept.join("\n");
        while updated.ends_with('\n') {
            updated.pop();
        }
        if !updated.is_empty() {
            updated.push('\n');
        }
        fs::write(&rc, updated).with_context(|| format!("writing {}", rc.display()))?;
        tracing::info!(rc = %rc.display(), "removed completion from shell profile");
        Ok(true)
    }
}

fn read_optional(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}
