//! # ft_templates
//!
//! Template manifests, parameter resolution and project materialization for
//! FlaskTrack.
//!
//! A template repository is a directory holding a `template.yaml` manifest
//! and a `template/` content tree. File names, directory names and file
//! contents may contain `{{ ft.<parameter> }}` tokens, which are replaced by
//! resolved parameter values when the tree is written out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use ft_templates::{GenerationContext, MaterializeOptions, Materializer, TemplateLoader};
//!
//! let loader = TemplateLoader::new("templates");
//! let repository = loader.load("flask-app").unwrap();
//!
//! let overrides = HashMap::from([("project_name".to_string(), "demo".to_string())]);
//! let ctx = GenerationContext::prepare(
//!     &repository,
//!     &overrides,
//!     None,
//!     ".",
//!     MaterializeOptions::new(),
//! )
//! .unwrap();
//!
//! let report = Materializer::new().materialize(&ctx).unwrap();
//! println!("wrote {} files", report.file_count());
//! ```

pub mod case;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod materializer;
pub mod params;
pub mod prompt;
pub mod renderer;
pub mod walker;

pub use error::{TemplateError, TemplateResult};
pub use loader::{TemplateLoader, TemplateRepository};
pub use manifest::{Manifest, ParameterSpec, ValidationRule};
pub use materializer::{GenerationContext, MaterializeOptions, MaterializeReport, Materializer};
pub use params::{ParameterResolver, ParameterSet};
pub use prompt::{ConsolePrompter, Prompter, ScriptedPrompter};
pub use renderer::{Filter, TokenRef, TokenSubstitutor};
pub use walker::{NodeKind, TemplateNode, TemplateWalker};
