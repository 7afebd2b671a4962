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

//! Interactive edit, validate and submit loop.
//!
//! Each round writes the current text to a fresh temporary file, runs the
//! editor on it, strips comment lines and parses what is left. Parse errors
//! and rejected submissions are written back as comments at the top of the
//! next round, above the operator's last text.

use crate::client::ResponseData;
use anyhow::Result;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::{env, fs};
use thiserror::Error;

const DEFAULT_EDITOR: &str = "vi";
const COMMENT_MARKERS: [&str; 2] = ["//", "#"];

#[derive(Debug, Error)]
pub enum EditError {
    #[error("editor command is empty")]
    EmptyEditor,
    #[error("could not launch editor `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("editor `{program}` failed: {status}")]
    EditorFailed { program: String, status: ExitStatus },
    #[error("edit buffer: {0}")]
    Buffer(#[from] io::Error),
}

pub trait Editor {
    /// Blocks until the operator is done with `path`.
    fn edit(&mut self, path: &Path) -> Result<(), EditError>;
}

/// Runs `$EDITOR` (or `$VISUAL`, or `vi`) with inherited stdio.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn from_env() -> Self {
        Self::new(choose_command(
            env::var("EDITOR").ok(),
            env::var("VISUAL").ok(),
        ))
    }

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Program and leading arguments. A command naming an existing file is
    /// taken whole, so paths containing spaces keep working.
    fn command_line(&self) -> Result<(String, Vec<String>), EditError> {
        let command = self.command.trim();
        if Path::new(command).is_file() {
            return Ok((command.to_string(), Vec::new()));
        }
        // `EDITOR="code --wait"` is common, so allow arguments.
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(EditError::EmptyEditor)?;
        Ok((program, parts.collect()))
    }
}

/// Blank variables count as unset.
fn choose_command(editor: Option<String>, visual: Option<String>) -> String {
    let set = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    set(editor)
        .or_else(|| set(visual))
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

impl Editor for ExternalEditor {
    fn edit(&mut self, path: &Path) -> Result<(), EditError> {
        let (program, args) = self.command_line()?;
        tracing::debug!(%program, path = %path.display(), "launching editor");

        let status = Command::new(&program)
            .args(&args)
            .arg(path)
            .status()
            .map_err(|source| EditError::Launch {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(EditError::EditorFailed { program, status });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// The server accepted the document.
    Submitted(ResponseData),
    /// The operator saved an empty buffer; nothing was sent.
    Aborted,
}

pub struct EditSession<E> {
    editor: E,
    content: String,
    last_error: Option<String>,
}

impl<E: Editor> EditSession<E> {
    pub fn new(editor: E, content: String) -> Self {
        Self {
            editor,
            content,
            last_error: None,
        }
    }

    /// Loops until `submit` succeeds or the operator empties the buffer.
    ///
    /// `submit` returning `Err` (transport failure) and editor failures end
    /// the session; parse errors and non-2xx responses start another round.
    pub fn run<S>(&mut self, mut submit: S) -> Result<Outcome>
    where
        S: FnMut(Map<String, Value>) -> Result<ResponseData>,
    {
        let mut round = 0u32;
        loop {
            round += 1;
            let edited = self.edit_round()?;
            let cleaned = strip_comments(&edited);
            if cleaned.trim().is_empty() {
                tracing::info!(round, "buffer empty, skipping submission");
                return Ok(Outcome::Aborted);
            }

            let document = match serde_json::from_str::<Map<String, Value>>(&cleaned) {
                Ok(document) => document,
                Err(err) => {
                    tracing::warn!(round, error = %err, "edited document is not a JSON object");
                    self.retry(cleaned, err.to_string());
                    continue;
                }
            };

            let response = submit(document)?;
            if response.is_success() {
                tracing::info!(round, status = response.status, "submission accepted");
                self.last_error = None;
                return Ok(Outcome::Submitted(response));
            }
            tracing::warn!(round, status = response.status, "submission rejected");
            self.retry(cleaned, format!("{}: {}", response.status, response.body.trim()));
        }
    }

    /// What the next editor round will open with.
    pub fn buffer(&self) -> String {
        annotate(&self.content, self.last_error.as_deref())
    }

    fn retry(&mut self, content: String, error: String) {
        self.content = content;
        self.last_error = Some(error);
    }

    /// The temporary file lives only for this round and is removed on drop,
    /// including when the editor fails.
    fn edit_round(&mut self) -> Result<String, EditError> {
        let mut file = tempfile::Builder::new()
            .prefix("grafctl-edit-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(self.buffer().as_bytes())?;
        file.flush()?;

        self.editor.edit(file.path())?;

        // Read by path: many editors replace the file instead of writing in place.
        Ok(fs::read_to_string(file.path())?)
    }
}

fn annotate(content: &str, error: Option<&str>) -> String {
    let Some(error) = error else {
        return content.to_string();
    };
    let mut out = String::new();
    let mut lines = error.lines();
    out.push_str(&format!("// ERROR: {}\n", lines.next().unwrap_or_default()));
    for line in lines {
        out.push_str(&format!("// {line}\n"));
    }
    out.push_str("// Fix the error below and save to retry.\n\n");
    out.push_str(content);
    out
}

pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Records what each round opened with and replaces it with the next
    /// scripted text.
    struct ScriptedEditor {
        saves: VecDeque<String>,
        seen: Rc<RefCell<Vec<String>>>,
        paths: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl ScriptedEditor {
        fn new(saves: &[&str]) -> Self {
            Self {
                saves: saves.iter().map(|s| s.to_string()).collect(),
                seen: Rc::default(),
                paths: Rc::default(),
            }
        }
    }

    impl Editor for ScriptedEditor {
        fn edit(&mut self, path: &Path) -> Result<(), EditError> {
            self.seen.borrow_mut().push(fs::read_to_string(path)?);
            self.paths.borrow_mut().push(path.to_path_buf());
            let next = self.saves.pop_front().expect("editor ran more rounds than scripted");
            fs::write(path, next)?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FailingEditor {
        paths: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Editor for FailingEditor {
        fn edit(&mut self, path: &Path) -> Result<(), EditError> {
            self.paths.borrow_mut().push(path.to_path_buf());
            Err(EditError::EmptyEditor)
        }
    }

    fn assert_removed(paths: &Rc<RefCell<Vec<PathBuf>>>) {
        assert!(!paths.borrow().is_empty());
        for path in paths.borrow().iter() {
            assert!(!path.exists(), "{} should be removed", path.display());
        }
    }

    fn ok_response() -> ResponseData {
        ResponseData {
            status: 200,
            body: r#"{"status":"success","uid":"u1","version":2}"#.into(),
            json: None,
        }
    }

    #[test]
    fn malformed_edit_is_offered_again_with_only_an_error_header() {
        let editor = ScriptedEditor::new(&[r#"{"title": "X""#, r#"{"title": "X"}"#]);
        let seen = editor.seen.clone();
        let mut session = EditSession::new(editor, "{\n  \"title\": \"T\"\n}".into());
        let mut submitted = Vec::new();

        let outcome = session
            .run(|doc| {
                submitted.push(doc);
                Ok(ok_response())
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Submitted(_)));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "{\n  \"title\": \"T\"\n}");
        let (header, body) = seen[1].split_once("\n\n").unwrap();
        assert_eq!(body, r#"{"title": "X""#);
        let header_lines: Vec<&str> = header.lines().collect();
        assert_eq!(header_lines.len(), 2);
        assert!(header_lines[0].starts_with("// ERROR: EOF while parsing"));
        assert_eq!(header_lines[1], "// Fix the error below and save to retry.");
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0]["title"], "X");
        assert!(!session.buffer().starts_with("// ERROR"));
    }

    #[test]
    fn blank_buffer_aborts_without_submitting() {
        let editor = ScriptedEditor::new(&["// ERROR: whatever\n\n   \n# note\n"]);
        let paths = editor.paths.clone();
        let mut session = EditSession::new(editor, "{}".into());
        let mut calls = 0;

        let outcome = session
            .run(|_| {
                calls += 1;
                Ok(ok_response())
            })
            .unwrap();

        assert!(matches!(outcome, Outcome::Aborted));
        assert_eq!(calls, 0);
        assert_removed(&paths);
    }

    #[test]
    fn rejected_submission_reopens_with_status_and_body() {
        let editor = ScriptedEditor::new(&[r#"{"title": "A"}"#, r#"{"title": "B"}"#]);
        let seen = editor.seen.clone();
        let paths = editor.paths.clone();
        let mut session = EditSession::new(editor, "{}".into());
        let mut responses = VecDeque::from([
            ResponseData {
                status: 412,
                body: "{\"message\":\"version-mismatch\"}\n".into(),
                json: None,
            },
            ok_response(),
        ]);

        session.run(|_| Ok(responses.pop_front().unwrap())).unwrap();

        let seen = seen.borrow();
        assert!(seen[1].starts_with("// ERROR: 412: {\"message\":\"version-mismatch\"}\n"));
        assert!(seen[1].ends_with(r#"{"title": "A"}"#));
        assert_eq!(paths.borrow().len(), 2);
        assert_removed(&paths);
    }

    #[test]
    fn transport_failure_ends_the_session() {
        let editor = ScriptedEditor::new(&[r#"{"title": "A"}"#]);
        let mut session = EditSession::new(editor, "{}".into());

        let err = session
            .run(|_| Err(anyhow::anyhow!("connection refused")))
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn editor_failure_is_fatal() {
        let editor = FailingEditor::default();
        let paths = editor.paths.clone();
        let mut session = EditSession::new(editor, "{}".into());
        let err = session.run(|_| Ok(ok_response())).unwrap_err();
        assert!(err.downcast_ref::<EditError>().is_some());
        assert_removed(&paths);
    }

    #[test]
    fn blank_editor_variables_fall_through() {
        assert_eq!(choose_command(Some(String::new()), Some("true".into())), "true");
        assert_eq!(choose_command(Some("  ".into()), None), DEFAULT_EDITOR);
        assert_eq!(choose_command(None, Some(String::new())), DEFAULT_EDITOR);
        assert_eq!(choose_command(Some("nano".into()), Some("true".into())), "nano");
    }

    #[cfg(unix)]
    #[test]
    fn falls_back_to_visual_when_editor_is_blank() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut editor = ExternalEditor::new(choose_command(Some(String::new()), Some("true".into())));
        editor.edit(file.path()).unwrap();
    }

    #[test]
    fn editor_path_with_spaces_is_one_program() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = dir.path().join("Sublime Text.app");
        fs::create_dir(&app).unwrap();
        let subl = app.join("subl");
        fs::write(&subl, "").unwrap();

        let editor = ExternalEditor::new(subl.to_string_lossy());
        let (program, args) = editor.command_line().unwrap();
        assert_eq!(program, subl.to_string_lossy());
        assert!(args.is_empty());

        let (program, args) = ExternalEditor::new("code --wait").command_line().unwrap();
        assert_eq!(program, "code");
        assert_eq!(args, ["--wait"]);
    }

    #[test]
    fn whitespace_only_command_is_rejected() {
        assert!(matches!(
            ExternalEditor::new("   ").command_line(),
            Err(EditError::EmptyEditor)
        ));
    }

    #[test]
    fn multi_line_errors_stay_commented() {
        let buffer = annotate("{}", Some("500: line one\nline two"));
        assert_eq!(strip_comments(&buffer).trim(), "{}");
        assert!(buffer.contains("// line two\n"));
    }

    #[test]
    fn non_object_json_is_retried() {
        let editor = ScriptedEditor::new(&["[1, 2]", r#"{"title": "ok"}"#]);
        let seen = editor.seen.clone();
        let mut session = EditSession::new(editor, "{}".into());

        session.run(|_| Ok(ok_response())).unwrap();

        assert!(seen.borrow()[1].starts_with("// ERROR: invalid type"));
    }
}
