//! Template loading functionality.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::Manifest;
use crate::renderer::TokenSubstitutor;
use crate::walker::{NodeKind, TemplateWalker};

const MANIFEST_FILES: [&str; 2] = ["template.yaml", "template.yml"];
const CONTENT_DIR: &str = "template";

/// A loaded template: its manifest and the content tree next to it.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    manifest: Manifest,
    root: PathBuf,
    content_dir: PathBuf,
}

impl TemplateRepository {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Directory holding the manifest.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory whose contents get materialized.
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn walker(&self) -> TemplateWalker {
        TemplateWalker::new(&self.content_dir)
    }

    /// Every token name used in the tree, with the relative paths using it.
    pub fn referenced_tokens(&self) -> TemplateResult<BTreeMap<String, Vec<PathBuf>>> {
        let substitutor = TokenSubstitutor::new();
        let mut tokens: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for node in self.walker().walk() {
            let node = node?;
            let mut record = |text: &str| {
                for token in substitutor.tokens(text) {
                    let users = tokens.entry(token.name).or_default();
                    if users.last() != Some(&node.relative_path) {
                        users.push(node.relative_path.clone());
                    }
                }
            };

            record(&node.relative_path.to_string_lossy());
            if let NodeKind::File { content } = &node.kind {
                if !self.manifest.is_copy_only(&node.relative_path) {
                    if let Ok(text) = std::str::from_utf8(content) {
                        record(text);
                    }
                }
            }
        }

        Ok(tokens)
    }

    /// Parameters referenced from file or directory names.
    pub fn path_parameters(&self) -> TemplateResult<BTreeSet<String>> {
        let substitutor = TokenSubstitutor::new();
        let mut names = BTreeSet::new();
        for node in self.walker().walk() {
            let node = node?;
            for token in substitutor.tokens(&node.relative_path.to_string_lossy()) {
                names.insert(token.name);
            }
        }
        Ok(names)
    }

    /// Markers that do not parse as tokens, with the relative path holding each.
    pub fn malformed_tokens(&self) -> TemplateResult<Vec<(PathBuf, String)>> {
        let substitutor = TokenSubstitutor::new();
        let mut found = Vec::new();

        for node in self.walker().walk() {
            let node = node?;
            let mut texts = vec![node.relative_path.to_string_lossy().into_owned()];
            if let NodeKind::File { content } = &node.kind {
                if !self.manifest.is_copy_only(&node.relative_path) {
                    if let Ok(text) = std::str::from_utf8(content) {
                        texts.push(text.to_string());
                    }
                }
            }
            for text in &texts {
                for token in substitutor.malformed(text) {
                    found.push((node.relative_path.clone(), token));
                }
            }
        }

        Ok(found)
    }

    /// Fail if the tree uses a token the manifest does not declare, or a
    /// marker that is not a well-formed token.
    pub fn verify(&self) -> TemplateResult<()> {
        let mut problems: Vec<String> = self
            .malformed_tokens()?
            .into_iter()
            .map(|(path, token)| format!("malformed token '{}' in {}", token, path.display()))
            .collect();

        let undeclared: Vec<String> = self
            .referenced_tokens()?
            .into_iter()
            .filter(|(name, _)| self.manifest.parameter(name).is_none())
            .map(|(name, paths)| {
                let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                format!("'{}' used in {}", name, paths.join(", "))
            })
            .collect();
        if !undeclared.is_empty() {
            problems.push(format!("undeclared tokens: {}", undeclared.join("; ")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TemplateError::configuration(
                &self.manifest.id,
                problems.join("; "),
            ))
        }
    }
}

/// Template loader.
pub struct TemplateLoader {
    templates_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    pub fn templates_path(&self) -> &Path {
        &self.templates_path
    }

    /// Identifiers of every template directory holding a manifest, sorted.
    pub fn discover(&self) -> TemplateResult<Vec<String>> {
        let mut ids = Vec::new();

        if !self.templates_path.exists() {
            warn!("Templates directory does not exist: {:?}", self.templates_path);
            return Ok(ids);
        }

        for entry in WalkDir::new(&self.templates_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if find_manifest(entry.path()).is_some() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            } else {
                debug!("Skipping {:?}: no manifest", entry.path());
            }
        }

        Ok(ids)
    }

    /// Load a template by identifier.
    pub fn load(&self, id: &str) -> TemplateResult<TemplateRepository> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(TemplateError::NotFound(id.to_string()));
        }

        let root = self.templates_path.join(id);
        if !root.is_dir() {
            return Err(TemplateError::NotFound(format!(
                "{} (looked in {})",
                id,
                self.templates_path.display()
            )));
        }

        let manifest_path = find_manifest(&root).ok_or_else(|| {
            TemplateError::configuration(id, format!("no template.yaml found in {}", root.display()))
        })?;
        let manifest = self.load_manifest(id, &manifest_path)?;
        if manifest.id != id {
            warn!(
                "Manifest id '{}' does not match template directory '{}'",
                manifest.id, id
            );
        }

        let content_dir = root.join(CONTENT_DIR);
        if !content_dir.is_dir() {
            return Err(TemplateError::configuration(
                id,
                format!("missing '{}' content directory", CONTENT_DIR),
            ));
        }

        info!("Loaded template: {} ({})", manifest.name, manifest.id);
        Ok(TemplateRepository {
            manifest,
            root,
            content_dir,
        })
    }

    /// Load a manifest file.
    fn load_manifest(&self, id: &str, path: &Path) -> TemplateResult<Manifest> {
        debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        Manifest::from_yaml(id, &content)
    }
}

fn find_manifest(dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_template(root: &Path, manifest: &str) {
        fs::create_dir_all(root.join("template")).unwrap();
        fs::write(root.join("template.yaml"), manifest).unwrap();
    }

    #[test]
    fn test_loader_empty_dir() {
        let temp = tempdir().unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert!(loader.discover().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_template() {
        let temp = tempdir().unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert!(matches!(loader.load("nope"), Err(TemplateError::NotFound(_))));
        assert!(matches!(loader.load("../etc"), Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_malformed_manifest_is_configuration_error() {
        let temp = tempdir().unwrap();
        write_template(&temp.path().join("broken"), "id: [unclosed\n");
        let loader = TemplateLoader::new(temp.path());
        assert!(matches!(
            loader.load("broken"),
            Err(TemplateError::Configuration { .. })
        ));
    }

    #[test]
    fn test_discover_skips_dirs_without_manifest() {
        let temp = tempdir().unwrap();
        write_template(&temp.path().join("app"), "id: app\nname: App\n");
        fs::create_dir_all(temp.path().join("scaffold")).unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert_eq!(loader.discover().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn test_verify_reports_undeclared_tokens() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("app");
        write_template(
            &root,
            "id: app\nname: App\nparameters:\n  - name: project_slug\n    default: app\n",
        );
        fs::create_dir_all(root.join("template/{{ ft.project_slug }}")).unwrap();
        fs::write(
            root.join("template/{{ ft.project_slug }}/README.md"),
            "# {{ ft.project_title }}\n",
        )
        .unwrap();

        let repo = TemplateLoader::new(temp.path()).load("app").unwrap();
        let tokens = repo.referenced_tokens().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            repo.path_parameters().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["project_slug".to_string()]
        );

        let err = repo.verify().unwrap_err();
        assert!(err.to_string().contains("'project_title' used in"));
    }

    #[test]
    fn test_verify_reports_malformed_tokens() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("app");
        write_template(
            &root,
            "id: app\nname: App\nparameters:\n  - name: project_slug\n    default: app\n",
        );
        fs::write(
            root.join("template/README.md"),
            "# {{ ft.project slug }} {{ ft.project_slug|x y }}\n",
        )
        .unwrap();

        let repo = TemplateLoader::new(temp.path()).load("app").unwrap();
        assert_eq!(
            repo.malformed_tokens().unwrap(),
            vec![
                (PathBuf::from("README.md"), "{{ ft.project slug }}".to_string()),
                (PathBuf::from("README.md"), "{{ ft.project_slug|x y }}".to_string()),
            ]
        );

        let err = repo.verify().unwrap_err();
        assert!(matches!(err, TemplateError::Configuration { .. }));
        assert!(err.to_string().contains("malformed token '{{ ft.project slug }}' in README.md"));
    }
}
