//! Interactive input.
//!
//! Prompting is a capability handed to the resolver, so tests can swap the
//! console for a scripted source.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use console::Term;

use crate::error::{TemplateError, TemplateResult};

/// Source of answers for interactive questions.
pub trait Prompter {
    /// Ask a question. An empty answer means "accept the default".
    fn prompt(&mut self, label: &str, default: Option<&str>) -> TemplateResult<String>;

    /// Ask for a secret value such as a password.
    fn prompt_secret(&mut self, label: &str) -> TemplateResult<String> {
        self.prompt(label, None)
    }
}

/// Prompter reading lines from a reader and writing questions to a writer.
///
/// Secrets are read without echo when a terminal is attached; otherwise they
/// come from the reader like any other answer.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
    terminal: Option<Term>,
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout()).with_terminal(Term::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            terminal: None,
        }
    }

    /// Read secrets through `terminal` with echo disabled.
    pub fn with_terminal(mut self, terminal: Term) -> Self {
        self.terminal = Some(terminal);
        self
    }

    fn read_answer(&mut self) -> TemplateResult<String> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Err(TemplateError::Prompt("input closed".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn prompt(&mut self, label: &str, default: Option<&str>) -> TemplateResult<String> {
        match default {
            Some(d) if !d.is_empty() => write!(self.output, "{} [{}]: ", label, d)?,
            _ => write!(self.output, "{}: ", label)?,
        }
        self.output.flush()?;
        self.read_answer()
    }

    fn prompt_secret(&mut self, label: &str) -> TemplateResult<String> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        match &self.terminal {
            Some(term) if term.is_term() => Ok(term.read_secure_line()?),
            _ => self.read_answer(),
        }
    }
}

/// Prompter that replays a fixed list of answers and records the questions.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Labels of the questions asked so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, label: &str, _default: Option<&str>) -> TemplateResult<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| TemplateError::Prompt(format!("no scripted answer for '{}'", label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_prompt_shows_default() {
        let mut out = Vec::new();
        let answer = {
            let mut prompter = ConsolePrompter::new("blog\n".as_bytes(), &mut out);
            prompter.prompt("Project slug", Some("my_app")).unwrap()
        };
        assert_eq!(answer, "blog");
        assert_eq!(String::from_utf8(out).unwrap(), "Project slug [my_app]: ");
    }

    #[test]
    fn test_secret_without_terminal_reads_input() {
        let mut out = Vec::new();
        let answer = {
            let mut prompter = ConsolePrompter::new("hunter2\n".as_bytes(), &mut out);
            prompter.prompt_secret("Password").unwrap()
        };
        assert_eq!(answer, "hunter2");
        assert_eq!(String::from_utf8(out).unwrap(), "Password: ");
    }

    #[test]
    fn test_console_prompt_eof() {
        let mut prompter = ConsolePrompter::new("".as_bytes(), Vec::new());
        assert!(matches!(
            prompter.prompt("Name", None),
            Err(TemplateError::Prompt(_))
        ));
    }

    #[test]
    fn test_scripted_runs_out() {
        let mut prompter = ScriptedPrompter::new(["one"]);
        assert_eq!(prompter.prompt("a", None).unwrap(), "one");
        assert!(prompter.prompt_secret("b").is_err());
        assert_eq!(prompter.asked(), ["a", "b"]);
    }
}
