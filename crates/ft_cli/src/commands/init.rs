//! Init command - Create a new Flask project from a template.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use ft_templates::{GenerationContext, MaterializeOptions, Materializer, Prompter, TemplateLoader};

use super::{CommandContext, CommandError};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of the project, or `.` to name it after the current directory
    project_name: String,

    /// Create the project exactly at this path
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Template to use
    #[arg(short, long, default_value = "flask-app")]
    template: String,

    /// Set a template parameter (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Prompt for every template parameter
    #[arg(short, long)]
    interactive: bool,

    /// Overwrite files that already exist
    #[arg(short, long)]
    force: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Where the project lands and which parameters that placement fixes.
struct Placement {
    output_root: PathBuf,
    project_name: String,
    project_slug: Option<String>,
}

fn placement(args: &InitArgs, ctx: &CommandContext) -> Result<Placement> {
    if let Some(dir) = &args.dir {
        let target = ctx.resolve(dir);
        let slug = directory_name(&target)?;
        let output_root = target
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| ctx.cwd.clone());
        let project_name = if args.project_name == "." {
            slug.clone()
        } else {
            args.project_name.clone()
        };
        return Ok(Placement {
            output_root,
            project_name,
            project_slug: Some(slug),
        });
    }

    // `.` names the project after the current directory and creates it inside.
    let project_name = if args.project_name == "." {
        directory_name(&ctx.cwd)?
    } else {
        args.project_name.clone()
    };
    Ok(Placement {
        output_root: ctx.cwd.clone(),
        project_name,
        project_slug: None,
    })
}

fn directory_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!("cannot create a project at {}", path.display()))
                .into()
        })
}

/// Generate the project and return its directory.
pub fn execute(
    args: InitArgs,
    ctx: &CommandContext,
    prompter: &mut dyn Prompter,
) -> Result<PathBuf> {
    let placement = placement(&args, ctx)?;
    info!("Creating project: {}", placement.project_name);

    let loader = TemplateLoader::new(&ctx.templates_dir);
    let repository = loader
        .load(&args.template)
        .with_context(|| format!("Failed to load template '{}'", args.template))?;
    let manifest = repository.manifest();

    let mut overrides: HashMap<String, String> = args.set.iter().cloned().collect();
    if manifest.parameter("project_name").is_some() {
        overrides.insert("project_name".to_string(), placement.project_name.clone());
    }
    if let Some(slug) = &placement.project_slug {
        if manifest.parameter("project_slug").is_some() {
            overrides.insert("project_slug".to_string(), slug.clone());
        }
    }

    let options = MaterializeOptions::new().overwrite(args.force);
    let interactive = if args.interactive { Some(prompter) } else { None };
    let generation = GenerationContext::prepare(
        &repository,
        &overrides,
        interactive,
        &placement.output_root,
        options,
    )
    .context("Failed to resolve template parameters")?;

    let report = Materializer::new()
        .materialize(&generation)
        .context("Failed to materialize template")?;

    let project_dir = match generation.parameters.get("project_slug") {
        Some(slug) => placement.output_root.join(slug),
        None => placement.output_root.clone(),
    };

    if !ctx.quiet {
        println!(
            "✅ Project '{}' created successfully!",
            generation
                .parameters
                .get("project_name")
                .unwrap_or(&placement.project_name)
        );
        println!();
        println!("Location: {}", project_dir.display());
        println!("Files:    {}", report.file_count());
        println!();
        println!("Next steps:");
        if project_dir != ctx.cwd {
            println!("  cd {}", project_dir.display());
        }
        println!("  just install");
        println!("  just run");
    }

    Ok(project_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use clap::Parser;
    use ft_templates::{ScriptedPrompter, TemplateError};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: InitArgs,
    }

    fn args(argv: &[&str]) -> InitArgs {
        let mut full = vec!["init"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("flask_port=8080").unwrap(),
            ("flask_port".to_string(), "8080".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_init_demo() {
        let temp = tempdir().unwrap();
        let ctx = test_context(temp.path());
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        let project = execute(args(&["demo"]), &ctx, &mut prompter).unwrap();
        assert_eq!(project, temp.path().join("demo"));
        let env = fs::read_to_string(project.join(".env")).unwrap();
        assert!(env.contains("5000"));
        assert!(project.join("app/__init__.py").is_file());
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_init_with_dir_and_overrides() {
        let temp = tempdir().unwrap();
        let ctx = test_context(temp.path());
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        let project = execute(
            args(&["Blog", "--dir", "sites/blog_app", "--set", "flask_port=8080"]),
            &ctx,
            &mut prompter,
        )
        .unwrap();
        assert_eq!(project, temp.path().join("sites/blog_app"));
        assert!(fs::read_to_string(project.join(".env")).unwrap().contains("8080"));
    }

    #[test]
    fn test_init_dot_creates_project_inside_current_directory() {
        let temp = tempdir().unwrap();
        let cwd = temp.path().join("my-awesome-app");
        fs::create_dir_all(&cwd).unwrap();
        let ctx = test_context(&cwd);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        let project = execute(args(&["."]), &ctx, &mut prompter).unwrap();
        assert_eq!(project, cwd.join("my_awesome_app"));
        assert!(project.join("app.py").is_file());
        assert!(!cwd.join("app.py").exists());
    }

    #[test]
    fn test_init_twice_conflicts() {
        let temp = tempdir().unwrap();
        let ctx = test_context(temp.path());
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        execute(args(&["demo"]), &ctx, &mut prompter).unwrap();
        let err = execute(args(&["demo"]), &ctx, &mut prompter).unwrap_err();
        assert!(err
            .chain()
            .any(|c| matches!(c.downcast_ref::<TemplateError>(), Some(TemplateError::DestinationConflict(_)))));

        execute(args(&["demo", "--force"]), &ctx, &mut prompter).unwrap();
    }

    #[test]
    fn test_interactive_uses_prompter() {
        let temp = tempdir().unwrap();
        let ctx = test_context(temp.path());
        // project_name is fixed by the argument; every other parameter is asked.
        let mut prompter = ScriptedPrompter::new(vec!["", "", "", "", "", "9000", ""]);

        let project = execute(args(&["demo", "-i"]), &ctx, &mut prompter).unwrap();
        assert!(!prompter.asked().is_empty());
        assert!(fs::read_to_string(project.join(".env")).unwrap().contains("9000"));
    }
}
