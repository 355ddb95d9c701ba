//! Materialization: writing a substituted copy of a template tree.
//!
//! The pipeline for one invocation is load → resolve → walk → substitute →
//! write. Everything it needs travels in a [`GenerationContext`] built fresh
//! per call.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};
use crate::loader::TemplateRepository;
use crate::params::{ParameterResolver, ParameterSet};
use crate::prompt::Prompter;
use crate::renderer::TokenSubstitutor;
use crate::walker::NodeKind;

/// Options controlling how output is written.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Replace files that already exist at the destination.
    pub overwrite: bool,
}

impl MaterializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Everything one generation run needs.
pub struct GenerationContext<'a> {
    pub repository: &'a TemplateRepository,
    pub parameters: ParameterSet,
    /// Directory the template's top-level entries are written into.
    pub destination: PathBuf,
    pub options: MaterializeOptions,
}

impl<'a> GenerationContext<'a> {
    /// Resolve parameters for `repository` and bundle them with the destination.
    pub fn prepare(
        repository: &'a TemplateRepository,
        overrides: &HashMap<String, String>,
        prompter: Option<&mut dyn Prompter>,
        destination: impl Into<PathBuf>,
        options: MaterializeOptions,
    ) -> TemplateResult<Self> {
        let parameters = ParameterResolver::new(repository.manifest())
            .with_path_parameters(repository.path_parameters()?)
            .resolve(overrides, prompter)?;

        Ok(Self {
            repository,
            parameters,
            destination: destination.into(),
            options,
        })
    }
}

/// Summary of a materialization run.
#[derive(Debug, Clone, Default)]
pub struct MaterializeReport {
    /// Top-level paths created under the destination.
    pub roots: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
    /// Files written after substitution.
    pub rendered_files: Vec<PathBuf>,
    /// Files copied byte for byte.
    pub copied_files: Vec<PathBuf>,
}

impl MaterializeReport {
    pub fn file_count(&self) -> usize {
        self.rendered_files.len() + self.copied_files.len()
    }
}

/// Writes template trees to disk.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    substitutor: TokenSubstitutor,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize the context's template into its destination.
    ///
    /// Stops at the first error; whatever was already written stays on disk.
    pub fn materialize(&self, ctx: &GenerationContext<'_>) -> TemplateResult<MaterializeReport> {
        let manifest = ctx.repository.manifest();
        info!(
            "Materializing template {} into {:?}",
            manifest.id, ctx.destination
        );

        fs::create_dir_all(&ctx.destination)?;
        let mut report = MaterializeReport::default();

        for node in ctx.repository.walker().walk() {
            let node = node?;
            let rendered = self.render_path(&node.relative_path, &ctx.parameters, &node.source_path)?;
            let target = ctx.destination.join(&rendered);
            if rendered.components().count() == 1 {
                report.roots.push(target.clone());
            }

            match &node.kind {
                NodeKind::Directory => {
                    fs::create_dir_all(&target)?;
                    debug!("Created directory {:?}", rendered);
                    report.directories.push(target);
                }
                NodeKind::File { content } => {
                    if target.exists() && !ctx.options.overwrite {
                        return Err(TemplateError::DestinationConflict(target));
                    }
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }

                    let text = if manifest.is_copy_only(&node.relative_path) {
                        None
                    } else {
                        std::str::from_utf8(content).ok()
                    };

                    match text {
                        Some(text) => {
                            let body =
                                self.substitutor
                                    .substitute(text, &ctx.parameters, &node.source_path)?;
                            fs::write(&target, body)?;
                            debug!("Rendered: {:?}", rendered);
                            report.rendered_files.push(target.clone());
                        }
                        None => {
                            fs::write(&target, content)?;
                            debug!("Copied: {:?}", rendered);
                            report.copied_files.push(target.clone());
                        }
                    }
                    fs::set_permissions(&target, fs::metadata(&node.source_path)?.permissions())?;
                }
            }
        }

        info!(
            "Wrote {} files and {} directories",
            report.file_count(),
            report.directories.len()
        );
        Ok(report)
    }

    /// Substitute tokens in each component of a template-relative path.
    fn render_path(
        &self,
        relative: &Path,
        parameters: &ParameterSet,
        origin: &Path,
    ) -> TemplateResult<PathBuf> {
        let mut rendered = PathBuf::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                continue;
            };
            let part = self
                .substitutor
                .substitute(&part.to_string_lossy(), parameters, origin)?;
            if part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']) {
                return Err(TemplateError::validation(
                    relative.display().to_string(),
                    part,
                    "path component rendered to an unusable name",
                ));
            }
            rendered.push(part);
        }
        Ok(rendered)
    }
}
