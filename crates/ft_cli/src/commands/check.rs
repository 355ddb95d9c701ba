//! Check command - Verify that templates declare every token they use.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::info;

use ft_scaffold::{Resource, ScaffoldAppender};
use ft_templates::{TemplateLoader, TokenSubstitutor};

use super::CommandContext;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Specific template to check (checks all if not specified)
    #[arg(short, long)]
    template: Option<String>,
}

pub fn execute(args: CheckArgs, ctx: &CommandContext) -> Result<()> {
    info!("Checking templates in {:?}", ctx.templates_dir);

    if !ctx.templates_dir.is_dir() {
        anyhow::bail!("Templates directory not found: {}", ctx.templates_dir.display());
    }

    let loader = TemplateLoader::new(&ctx.templates_dir);
    let ids = match &args.template {
        Some(id) => vec![id.clone()],
        None => loader.discover().context("Failed to discover templates")?,
    };

    if ids.is_empty() && !ctx.quiet {
        println!("⚠️  No templates found to check");
    }

    for id in &ids {
        let repository = loader
            .load(id)
            .with_context(|| format!("Failed to load template '{}'", id))?;
        repository
            .verify()
            .with_context(|| format!("Template '{}' failed verification", id))?;
        if !ctx.quiet {
            let tokens = repository.referenced_tokens()?.len();
            println!("✅ {} ({} tokens)", id, tokens);
        }
    }

    // Fragment tokens are derived from the resource, so render a sample one.
    let scaffold_dir = ctx.templates_dir.join("scaffold");
    if args.template.is_none() && scaffold_dir.is_dir() {
        let appender =
            ScaffoldAppender::load(&scaffold_dir).context("Failed to load scaffold fragments")?;
        let sample = Resource::new("Sample", &["name:string", "owner:references"])?;
        let substitutor = TokenSubstitutor::new();
        for fragment in appender.render(&sample, Utc::now(), None)? {
            if substitutor.contains_marker(&fragment.content) {
                anyhow::bail!(
                    "Scaffold fragment {} leaves unresolved tokens in {}",
                    fragment.kind,
                    fragment.destination.display()
                );
            }
        }
        if !ctx.quiet {
            println!("✅ scaffold ({} fragments)", appender.fragments().len());
        }
    }

    Ok(())
}
