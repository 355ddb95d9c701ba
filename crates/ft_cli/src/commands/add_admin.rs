//! Add-admin command - Create an administrator in a generated project.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use ft_templates::{Prompter, ValidationRule};

use super::{CommandContext, CommandError};

/// Exit status `manage.py add-user` uses when the user already exists.
const USER_EXISTS_STATUS: i32 = 3;

#[derive(Args, Debug)]
pub struct AddAdminArgs {
    /// Username for the new admin
    username: String,

    /// Email address for the new admin
    email: String,

    /// Password for the new user (prompted for if not provided)
    #[arg(short, long)]
    password: Option<String>,

    /// Path to the Flask application directory
    #[arg(short, long)]
    app_path: Option<PathBuf>,
}

/// Persists users in a generated application.
#[cfg_attr(test, mockall::automock)]
pub trait UserStore {
    /// Create an admin user. Returns `false` when the user already exists.
    fn create_admin(&self, username: &str, email: &str, password: &str) -> Result<bool>;
}

/// Runs the project's `manage.py add-user` with its own interpreter.
pub struct PythonUserStore {
    project: PathBuf,
}

impl PythonUserStore {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
        }
    }

    /// The project's virtualenv interpreter, else `python3` from PATH.
    fn interpreter(&self) -> PathBuf {
        let candidates = [
            self.project.join(".venv").join("bin").join("python"),
            self.project.join(".venv").join("Scripts").join("python.exe"),
        ];
        candidates
            .into_iter()
            .find(|p| p.is_file())
            .unwrap_or_else(|| PathBuf::from("python3"))
    }
}

impl UserStore for PythonUserStore {
    fn create_admin(&self, username: &str, email: &str, password: &str) -> Result<bool> {
        let python = self.interpreter();
        debug!("Running manage.py add-user with {:?}", python);

        // The password goes over stdin so it never shows up in argv.
        let mut child = Command::new(&python)
            .current_dir(&self.project)
            .arg("manage.py")
            .arg("add-user")
            .arg("--username")
            .arg(username)
            .arg("--email")
            .arg(email)
            .arg("--admin")
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", python.display()))?;

        // Closing stdin before waiting lets the child see EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(password.as_bytes())
                .and_then(|()| stdin.write_all(b"\n")),
            None => Ok(()),
        };

        let status = child.wait()?;
        let created = add_user_outcome(status.code(), &status.to_string())?;
        written.context("Failed to pass the password to manage.py")?;
        Ok(created)
    }
}

/// Interpret the exit status of `manage.py add-user`.
fn add_user_outcome(code: Option<i32>, status: &str) -> Result<bool> {
    match code {
        Some(0) => Ok(true),
        Some(USER_EXISTS_STATUS) => Ok(false),
        _ => anyhow::bail!("manage.py add-user failed ({})", status),
    }
}

pub fn execute(args: AddAdminArgs, ctx: &CommandContext, prompter: &mut dyn Prompter) -> Result<()> {
    let project = match &args.app_path {
        Some(path) => ctx.resolve(path),
        None => ctx.cwd.clone(),
    };
    let store = PythonUserStore::new(&project);
    run(args, &project, &store, prompter, ctx.quiet)
}

fn run(
    args: AddAdminArgs,
    project: &Path,
    store: &dyn UserStore,
    prompter: &mut dyn Prompter,
    quiet: bool,
) -> Result<()> {
    info!("Adding admin user: {}", args.username);

    if !project.join("app.py").is_file() || !project.join("app").is_dir() {
        return Err(CommandError::NotAProject(project.to_path_buf()).into());
    }
    if args.username.trim().is_empty() {
        return Err(CommandError::Validation("username must not be empty".to_string()).into());
    }
    ValidationRule::Email
        .check(&args.email)
        .map_err(|reason| CommandError::Validation(format!("email '{}': {}", args.email, reason)))?;

    let password = match args.password {
        Some(password) => password,
        None => read_password(prompter)?,
    };
    if password.is_empty() {
        return Err(CommandError::Validation("password must not be empty".to_string()).into());
    }

    let created = store
        .create_admin(&args.username, &args.email, &password)
        .context("Failed to add admin")?;
    if !created {
        anyhow::bail!("Failed to add admin. User '{}' might already exist.", args.username);
    }

    if !quiet {
        println!("✅ Admin user '{}' added successfully!", args.username);
        println!("  Email: {}", args.email);
        println!("  Role: Administrator");
    }
    Ok(())
}

fn read_password(prompter: &mut dyn Prompter) -> Result<String> {
    let first = prompter.prompt_secret("Password")?;
    let second = prompter.prompt_secret("Repeat for confirmation")?;
    if first != second {
        return Err(CommandError::Validation("the two passwords do not match".to_string()).into());
    }
    Ok(first)
}
