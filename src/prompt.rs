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

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed while waiting for an answer")]
    Closed,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Operator interaction used while importing dashboards.
pub trait Prompter {
    /// Zero-based index into `options`. Keeps asking until the answer is valid.
    fn select(&mut self, title: &str, options: &[String]) -> Result<usize, PromptError>;
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError>;
    fn ask(&mut self, question: &str) -> Result<String, PromptError>;
}

pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> Result<String, PromptError> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, title: &str, options: &[String]) -> Result<usize, PromptError> {
        writeln!(self.output, "\n{title}:")?;
        for (idx, option) in options.iter().enumerate() {
            writeln!(self.output, "[{}] {}", idx + 1, option)?;
        }
        loop {
            write!(self.output, "Enter number: ")?;
            let answer = self.read_answer()?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => {
                    tracing::debug!(%answer, "rejected selection");
                    writeln!(self.output, "Invalid selection. Please try again.")?;
                }
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        write!(self.output, "{question} [y/N]: ")?;
        let answer = self.read_answer()?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        write!(self.output, "{question}: ")?;
        self.read_answer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn select_repeats_until_answer_is_in_range() {
        let mut p = prompter("abc\n0\n3\n2\n");
        let options = vec!["Prom (UID: a)".to_string(), "Prom2 (UID: b)".to_string()];

        let choice = p.select("Select datasource", &options).unwrap();

        assert_eq!(choice, 1);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Invalid selection").count(), 3);
        assert!(out.contains("[2] Prom2 (UID: b)"));
    }

    #[test]
    fn select_fails_when_input_ends() {
        let mut p = prompter("9\n");
        let err = p.select("Pick", &["only".to_string()]).unwrap_err();
        assert!(matches!(err, PromptError::Closed));
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut p = prompter("\nY\nnope\n");
        assert!(!p.confirm("Change title?").unwrap());
        assert!(p.confirm("Change title?").unwrap());
        assert!(!p.confirm("Change title?").unwrap());
    }
}
