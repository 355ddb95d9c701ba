//! Fragment manifest (`scaffold.yaml`) loading.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{ScaffoldError, ScaffoldResult};

pub const FRAGMENT_MANIFEST: &str = "scaffold.yaml";

/// What a fragment produces in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Model,
    Form,
    Controller,
    View,
    Migration,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentKind::Model => "model",
            FragmentKind::Form => "form",
            FragmentKind::Controller => "controller",
            FragmentKind::View => "view",
            FragmentKind::Migration => "migration",
        };
        write!(f, "{}", name)
    }
}

/// One fragment template and where its output goes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Template file, relative to the fragment directory.
    pub source: PathBuf,
    /// Output path pattern, relative to the project root. May contain tokens.
    pub destination: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFragmentManifest {
    #[serde(default)]
    fragments: Vec<Fragment>,
}

/// Fragments declared in a scaffold directory, with their template text loaded.
#[derive(Debug, Clone)]
pub struct FragmentSet {
    dir: PathBuf,
    fragments: Vec<(Fragment, String)>,
}

impl FragmentSet {
    /// Load `scaffold.yaml` from `dir` and read every fragment source.
    pub fn load(dir: impl Into<PathBuf>) -> ScaffoldResult<Self> {
        let dir = dir.into();
        let manifest_path = dir.join(FRAGMENT_MANIFEST);
        debug!("Loading fragment manifest from {:?}", manifest_path);

        let content = fs::read_to_string(&manifest_path).map_err(|e| ScaffoldError::Configuration {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;
        let raw: RawFragmentManifest =
            serde_yaml::from_str(&content).map_err(|e| ScaffoldError::Configuration {
                path: manifest_path.clone(),
                message: e.to_string(),
            })?;

        if raw.fragments.is_empty() {
            return Err(ScaffoldError::Configuration {
                path: manifest_path,
                message: "no fragments declared".to_string(),
            });
        }

        let mut fragments = Vec::with_capacity(raw.fragments.len());
        for fragment in raw.fragments {
            if fragment.destination.trim().is_empty() {
                return Err(ScaffoldError::Configuration {
                    path: manifest_path,
                    message: format!("{} fragment has an empty destination", fragment.kind),
                });
            }
            let source = dir.join(&fragment.source);
            let text = fs::read_to_string(&source).map_err(|e| ScaffoldError::Configuration {
                path: source.clone(),
                message: format!("cannot read {} fragment: {}", fragment.kind, e),
            })?;
            fragments.push((fragment, text));
        }

        Ok(Self { dir, fragments })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fragments with their template text, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Fragment, &str)> {
        self.fragments.iter().map(|(f, text)| (f, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
