//! CLI command definitions.
//!
//! Each subcommand maps to one generation workflow. Commands receive a
//! [`CommandContext`] instead of reading process state themselves.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod add_admin;
pub mod check;
pub mod init;
pub mod scaffold;

/// Templates shipped with the workspace.
const BUNDLED_TEMPLATES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates");

/// FlaskTrack - Rails-style project generator for Flask
#[derive(Parser)]
#[command(name = "flasktrack")]
#[command(version, about = "FlaskTrack - Rails-style project generator for Flask")]
#[command(long_about = r#"
FlaskTrack generates Flask applications from templates and adds resources
to them.

COMMANDS:
  init        → Create a new Flask project from a template
  scaffold    → Add a model, form, controller, view and migration
  add-admin   → Create an administrator in a generated project
  check       → Verify that templates declare every token they use

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments / not a project
  3 - Configuration error
  4 - Validation failure
  5 - Unresolved or invalid token
  6 - Destination conflict
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding the templates
    #[arg(long, global = true, env = "FLASKTRACK_TEMPLATES", value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new Flask project
    Init(init::InitArgs),

    /// Generate a resource scaffold in an existing project
    Scaffold(scaffold::ScaffoldArgs),

    /// Add an administrator to a generated project
    #[command(name = "add-admin")]
    AddAdmin(add_admin::AddAdminArgs),

    /// Check templates for undeclared tokens
    Check(check::CheckArgs),
}

/// Errors raised by the commands themselves rather than the libraries.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("No Flask application found at {0}")]
    NotAProject(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Process state a command runs against.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub cwd: PathBuf,
    pub templates_dir: PathBuf,
    pub quiet: bool,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        let templates_dir = cli
            .templates_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(BUNDLED_TEMPLATES));
        Ok(Self {
            templates_dir: absolutize(&cwd, &templates_dir),
            cwd,
            quiet: cli.quiet,
        })
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        absolutize(&self.cwd, path)
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
pub(crate) fn test_context(cwd: &Path) -> CommandContext {
    CommandContext {
        cwd: cwd.to_path_buf(),
        templates_dir: PathBuf::from(BUNDLED_TEMPLATES),
        quiet: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from([
            "flasktrack",
            "-v",
            "init",
            "demo",
            "--set",
            "flask_port=8080",
            "-f",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_scaffold_requires_fields() {
        assert!(Cli::try_parse_from(["flasktrack", "scaffold", "Post"]).is_err());
        assert!(Cli::try_parse_from(["flasktrack", "scaffold", "Post", "title:string"]).is_ok());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["flasktrack", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let ctx = test_context(Path::new("/work"));
        assert_eq!(ctx.resolve(Path::new("app")), PathBuf::from("/work/app"));
        assert_eq!(ctx.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
