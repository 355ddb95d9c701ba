//! Renders resource fragments into an existing project.
//!
//! Every fragment and destination is rendered in memory and every target is
//! checked before anything is written, so a bad field, an unresolved token or
//! a conflict leaves the project as it was.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use ft_templates::{ParameterSet, TokenSubstitutor};
use tracing::{debug, info};

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::fragment::{FragmentKind, FragmentSet};
use crate::migration;
use crate::resource::Resource;

/// Options for [`ScaffoldAppender::append`].
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// Replace fragment outputs that already exist.
    pub force: bool,
}

/// A fragment rendered in memory, not yet written.
#[derive(Debug, Clone)]
pub struct RenderedFragment {
    pub kind: FragmentKind,
    /// Path relative to the project root.
    pub destination: PathBuf,
    pub content: String,
}

/// Files written by one scaffold run.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldReport {
    pub created: Vec<PathBuf>,
    pub overwritten: Vec<PathBuf>,
}

/// Appends scaffold fragments to a project.
pub struct ScaffoldAppender {
    fragments: FragmentSet,
    substitutor: TokenSubstitutor,
}

impl ScaffoldAppender {
    pub fn new(fragments: FragmentSet) -> Self {
        Self {
            fragments,
            substitutor: TokenSubstitutor::new(),
        }
    }

    /// Load fragments from a scaffold directory.
    pub fn load(dir: impl Into<PathBuf>) -> ScaffoldResult<Self> {
        Ok(Self::new(FragmentSet::load(dir)?))
    }

    pub fn fragments(&self) -> &FragmentSet {
        &self.fragments
    }

    /// Render every fragment for `resource` without touching the filesystem.
    ///
    /// `down_revision` is the migration the new one follows, if any.
    pub fn render(
        &self,
        resource: &Resource,
        now: DateTime<Utc>,
        down_revision: Option<&str>,
    ) -> ScaffoldResult<Vec<RenderedFragment>> {
        let down_revision = migration::down_revision_literal(down_revision);
        let parameters = ParameterSet::from_pairs(
            resource
                .parameters(now)
                .iter()
                .chain([("migration_down_revision", down_revision.as_str())]),
        );
        let mut rendered = Vec::with_capacity(self.fragments.len());

        for (fragment, text) in self.fragments.iter() {
            let origin = self.fragments.dir().join(&fragment.source);
            let destination =
                self.substitutor
                    .substitute(&fragment.destination, &parameters, &origin)?;
            let destination = relative_destination(&destination, &origin)?;
            let content = self.substitutor.substitute(text, &parameters, &origin)?;
            debug!("Rendered {} fragment -> {:?}", fragment.kind, destination);
            rendered.push(RenderedFragment {
                kind: fragment.kind,
                destination,
                content,
            });
        }

        Ok(rendered)
    }

    /// Render and write all fragments for `resource` under `project_root`.
    pub fn append(
        &self,
        project_root: &Path,
        resource: &Resource,
        now: DateTime<Utc>,
        options: &ScaffoldOptions,
    ) -> ScaffoldResult<ScaffoldReport> {
        if !project_root.join("app").is_dir() {
            return Err(ScaffoldError::NotAProject(project_root.to_path_buf()));
        }

        info!("Scaffolding {} in {:?}", resource.name(), project_root);
        let head = migration::head_revision(project_root)?;
        let rendered = self.render(resource, now, head.as_deref())?;

        let mut existing = Vec::new();
        for fragment in &rendered {
            let target = project_root.join(&fragment.destination);
            if target.exists() {
                if !options.force {
                    return Err(ScaffoldError::DestinationConflict(target));
                }
                existing.push(target);
            }
        }

        let mut report = ScaffoldReport::default();
        for fragment in rendered {
            let target = project_root.join(&fragment.destination);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, fragment.content)?;
            debug!("Wrote {:?}", target);
            if existing.contains(&target) {
                report.overwritten.push(target);
            } else {
                report.created.push(target);
            }
        }

        info!(
            "Scaffolded {} ({} files)",
            resource.name(),
            report.created.len() + report.overwritten.len()
        );
        Ok(report)
    }
}

/// Destinations must stay inside the project.
fn relative_destination(rendered: &str, origin: &Path) -> ScaffoldResult<PathBuf> {
    let path = PathBuf::from(rendered);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.as_os_str().is_empty() {
        return Err(ScaffoldError::Configuration {
            path: origin.to_path_buf(),
            message: format!("destination '{}' is not a path inside the project", rendered),
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn appender(dir: &Path) -> ScaffoldAppender {
        fs::write(
            dir.join("scaffold.yaml"),
            "fragments:\n  - kind: model\n    source: model.tmpl\n    destination: \"app/models/{{ ft.resource_snake }}.py\"\n",
        )
        .unwrap();
        fs::write(dir.join("model.tmpl"), "class {{ ft.resource_name }}:\n{{ ft.model_columns }}\n").unwrap();
        ScaffoldAppender::load(dir).unwrap()
    }

    #[test]
    fn test_not_a_project() {
        let temp = tempdir().unwrap();
        let appender = appender(temp.path());
        let project = temp.path().join("empty");
        fs::create_dir_all(&project).unwrap();
        let resource = Resource::new("Post", &["title:string"]).unwrap();
        let err = appender
            .append(&project, &resource, Utc::now(), &ScaffoldOptions::default())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::NotAProject(_)));
    }

    #[test]
    fn test_conflict_writes_nothing_unless_forced() {
        let temp = tempdir().unwrap();
        let appender = appender(temp.path());
        let project = temp.path().join("proj");
        fs::create_dir_all(project.join("app/models")).unwrap();
        fs::write(project.join("app/models/post.py"), "mine").unwrap();

        let resource = Resource::new("Post", &["title:string"]).unwrap();
        let err = appender
            .append(&project, &resource, Utc::now(), &ScaffoldOptions::default())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::DestinationConflict(_)));
        assert_eq!(fs::read_to_string(project.join("app/models/post.py")).unwrap(), "mine");

        let report = appender
            .append(&project, &resource, Utc::now(), &ScaffoldOptions { force: true })
            .unwrap();
        assert_eq!(report.overwritten.len(), 1);
        assert!(fs::read_to_string(project.join("app/models/post.py"))
            .unwrap()
            .contains("title = db.Column(db.String(255))"));
    }

    #[test]
    fn test_destination_must_stay_inside_project() {
        assert!(relative_destination("../outside.py", Path::new("x")).is_err());
        assert!(relative_destination("/etc/passwd", Path::new("x")).is_err());
        assert!(relative_destination("app/models/post.py", Path::new("x")).is_ok());
    }
}
