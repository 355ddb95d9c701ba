//! Integration tests for the template system against the bundled templates.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use ft_templates::{
    GenerationContext, MaterializeOptions, Materializer, ParameterResolver, TemplateError,
    TemplateLoader, TemplateRepository, TokenSubstitutor,
};
use tempfile::tempdir;
use walkdir::WalkDir;

fn templates_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn flask_app() -> TemplateRepository {
    TemplateLoader::new(templates_path()).load("flask-app").unwrap()
}

fn demo_overrides() -> HashMap<String, String> {
    HashMap::from([("project_name".to_string(), "demo".to_string())])
}

fn generate(out: &Path, options: MaterializeOptions) -> Result<(), TemplateError> {
    let repo = flask_app();
    let ctx = GenerationContext::prepare(&repo, &demo_overrides(), None, out, options)?;
    Materializer::new().materialize(&ctx).map(|_| ())
}

/// Relative paths of every file under `root`, with their contents.
fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_discover_bundled_templates() {
    let loader = TemplateLoader::new(templates_path());
    let ids = loader.discover().unwrap();
    assert!(ids.contains(&"flask-app".to_string()));
    assert!(!ids.contains(&"scaffold".to_string()));
}

#[test]
fn test_flask_app_declares_every_token() {
    let repo = flask_app();
    repo.verify().unwrap();
    assert_eq!(
        repo.path_parameters().unwrap(),
        BTreeSet::from(["project_slug".to_string()])
    );
}

#[test]
fn test_non_interactive_resolution_is_deterministic() {
    let repo = flask_app();
    let resolver = ParameterResolver::new(repo.manifest());
    let first = resolver.resolve(&demo_overrides(), None).unwrap();
    let second = resolver.resolve(&demo_overrides(), None).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get("project_slug"), Some("demo"));
    assert_eq!(first.get("flask_port"), Some("5000"));
}

#[test]
fn test_init_demo_leaves_no_markers() {
    let temp = tempdir().unwrap();
    generate(temp.path(), MaterializeOptions::new()).unwrap();

    let project = temp.path().join("demo");
    assert!(project.join("app.py").is_file());
    assert!(project.join("app/views/base.html").is_file());
    assert!(project.join("migrations/env.py").is_file());
    assert!(project.join("migrations/script.py.mako").is_file());
    assert!(project.join("migrations/versions/0001_create_users.py").is_file());
    assert!(fs::read_to_string(project.join(".env"))
        .unwrap()
        .contains("FLASK_RUN_PORT=5000"));

    let substitutor = TokenSubstitutor::new();
    for (path, content) in snapshot(&project) {
        if let Ok(text) = String::from_utf8(content) {
            assert!(!substitutor.contains_marker(&text), "marker left in {:?}", path);
        }
        assert!(!substitutor.contains_marker(&path.to_string_lossy()));
    }
}

#[test]
fn test_jinja_views_survive_materialization() {
    let temp = tempdir().unwrap();
    generate(temp.path(), MaterializeOptions::new()).unwrap();
    let base = fs::read_to_string(temp.path().join("demo/app/views/base.html")).unwrap();
    assert!(base.contains("{%"));
}

#[test]
fn test_overwrite_is_idempotent() {
    let temp = tempdir().unwrap();
    generate(temp.path(), MaterializeOptions::new()).unwrap();
    let first = snapshot(temp.path());

    generate(temp.path(), MaterializeOptions::new().overwrite(true)).unwrap();
    assert_eq!(snapshot(temp.path()), first);
}

#[test]
fn test_second_init_conflicts_and_keeps_first_output() {
    let temp = tempdir().unwrap();
    generate(temp.path(), MaterializeOptions::new()).unwrap();
    let first = snapshot(temp.path());

    let err = generate(temp.path(), MaterializeOptions::new()).unwrap_err();
    assert!(matches!(err, TemplateError::DestinationConflict(_)));
    assert_eq!(snapshot(temp.path()), first);
}

#[test]
fn test_invalid_override_rejected_before_writing() {
    let temp = tempdir().unwrap();
    let repo = flask_app();
    let mut overrides = demo_overrides();
    overrides.insert("flask_port".to_string(), "99999".to_string());

    let err = GenerationContext::prepare(&repo, &overrides, None, temp.path(), MaterializeOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, TemplateError::Validation { ref parameter, .. } if parameter == "flask_port"));
    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[test]
fn test_slug_with_separator_rejected() {
    let repo = flask_app();
    let mut overrides = demo_overrides();
    overrides.insert("project_slug".to_string(), "../escape".to_string());
    let err = GenerationContext::prepare(&repo, &overrides, None, "out", MaterializeOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, TemplateError::Validation { .. }));
}
