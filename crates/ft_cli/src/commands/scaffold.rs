//! Scaffold command - Add a resource to an existing project.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::info;

use ft_scaffold::{register_resource, Registration, Resource, ScaffoldAppender, ScaffoldOptions};

use super::CommandContext;

#[derive(Args, Debug)]
pub struct ScaffoldArgs {
    /// Name of the resource (e.g. Post)
    resource: String,

    /// Field definitions (e.g. title:string content:text user:references)
    #[arg(required = true, value_name = "NAME:TYPE")]
    fields: Vec<String>,

    /// Project root (defaults to the current directory)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Skip updating app/__init__.py
    #[arg(long)]
    skip_init: bool,

    /// Overwrite files that already exist
    #[arg(short, long)]
    force: bool,
}

pub fn execute(args: ScaffoldArgs, ctx: &CommandContext) -> Result<()> {
    let project = match &args.project {
        Some(path) => ctx.resolve(path),
        None => ctx.cwd.clone(),
    };
    info!("Creating scaffold for {} in {:?}", args.resource, project);

    let resource = Resource::new(&args.resource, args.fields.as_slice())?;
    let appender = ScaffoldAppender::load(ctx.templates_dir.join("scaffold"))
        .context("Failed to load scaffold fragments")?;

    let options = ScaffoldOptions { force: args.force };
    let report = appender.append(&project, &resource, Utc::now(), &options)?;

    if !ctx.quiet {
        for path in &report.created {
            println!("✓ Created {}", relative(&project, path));
        }
        for path in &report.overwritten {
            println!("✓ Overwrote {}", relative(&project, path));
        }
    }

    if args.skip_init {
        return Ok(());
    }

    let plural = resource.plural();
    let model = resource.name();
    let report =
        register_resource(&project, &resource).context("Failed to update app/__init__.py")?;
    if ctx.quiet {
        return Ok(());
    }
    match report.blueprint {
        Registration::Added => println!("✓ Registered {}_bp in app/__init__.py", plural),
        Registration::AlreadyRegistered => {
            println!("ℹ️  {}_bp is already registered in app/__init__.py", plural)
        }
        Registration::NoRegistrationSite | Registration::MissingAppInit => {
            println!("⚠️  Could not find where to register the blueprint. Add to app/__init__.py:");
            println!("    from app.controllers.{plural} import {plural}_bp");
            println!("    app.register_blueprint({plural}_bp, url_prefix=\"/{plural}\")");
        }
    }
    match report.shell_context {
        Registration::Added => println!("✓ Added {} to the flask shell context", model),
        Registration::AlreadyRegistered => {}
        Registration::NoRegistrationSite | Registration::MissingAppInit => {
            println!(
                "⚠️  Could not find make_shell_context. Import {} there to use it in flask shell:",
                model
            );
            println!("    from app.models.{} import {}", resource.snake(), model);
        }
    }

    println!();
    println!("Next steps:");
    println!("  flask db upgrade");
    println!("  Visit /{} in your browser", plural);

    Ok(())
}

fn relative(root: &std::path::Path, path: &std::path::Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
