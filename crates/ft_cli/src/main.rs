//! FlaskTrack CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments / not a project
//! - 3: Configuration error
//! - 4: Validation failure
//! - 5: Unresolved or invalid token
//! - 6: Destination conflict

use std::process::ExitCode;

use clap::Parser;
use ft_scaffold::ScaffoldError;
use ft_templates::{ConsolePrompter, TemplateError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, CommandContext, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIGURATION_ERROR: u8 = 3;
    pub const VALIDATION_FAILURE: u8 = 4;
    pub const TOKEN_ERROR: u8 = 5;
    pub const DESTINATION_CONFLICT: u8 = 6;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "flasktrack=debug,ft_templates=debug,ft_scaffold=debug,warn"
    } else if cli.quiet {
        "warn"
    } else {
        "flasktrack=info,ft_templates=info,ft_scaffold=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logging may already be initialized; keep going either way.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    let result = CommandContext::from_cli(&cli).and_then(|ctx| match cli.command {
        Commands::Init(args) => {
            let mut prompter = ConsolePrompter::stdio();
            commands::init::execute(args, &ctx, &mut prompter).map(|_| ())
        }
        Commands::Scaffold(args) => commands::scaffold::execute(args, &ctx),
        Commands::AddAdmin(args) => {
            let mut prompter = ConsolePrompter::stdio();
            commands::add_admin::execute(args, &ctx, &mut prompter)
        }
        Commands::Check(args) => commands::check::execute(args, &ctx),
    });

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the root cause of an error to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return template_exit_code(err);
        }
        if let Some(err) = cause.downcast_ref::<ScaffoldError>() {
            return match err {
                ScaffoldError::Template(inner) => template_exit_code(inner),
                ScaffoldError::NotAProject(_) => ExitCodes::INVALID_ARGS,
                ScaffoldError::Configuration { .. } => ExitCodes::CONFIGURATION_ERROR,
                ScaffoldError::DestinationConflict(_) => ExitCodes::DESTINATION_CONFLICT,
                ScaffoldError::Io(_) => ExitCodes::GENERAL_ERROR,
                other if other.is_validation() => ExitCodes::VALIDATION_FAILURE,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<commands::CommandError>() {
            return match err {
                commands::CommandError::NotAProject(_) | commands::CommandError::InvalidArgument(_) => {
                    ExitCodes::INVALID_ARGS
                }
                commands::CommandError::Validation(_) => ExitCodes::VALIDATION_FAILURE,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn template_exit_code(err: &TemplateError) -> u8 {
    match err {
        TemplateError::NotFound(_) => ExitCodes::INVALID_ARGS,
        TemplateError::Configuration { .. } => ExitCodes::CONFIGURATION_ERROR,
        TemplateError::Validation { .. } => ExitCodes::VALIDATION_FAILURE,
        TemplateError::UnresolvedToken { .. }
        | TemplateError::InvalidToken { .. }
        | TemplateError::MalformedToken { .. } => ExitCodes::TOKEN_ERROR,
        TemplateError::DestinationConflict(_) => ExitCodes::DESTINATION_CONFLICT,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
