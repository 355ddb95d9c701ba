//! Template tree traversal.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::TemplateResult;

/// What a template node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File { content: Vec<u8> },
}

/// One file or directory of a template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    /// Path relative to the content root, still containing tokens.
    pub relative_path: PathBuf,
    /// Absolute path of the source on disk.
    pub source_path: PathBuf,
    pub kind: NodeKind,
}

impl TemplateNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }
}

/// Walks a template content directory.
///
/// Directories come before their children and siblings are visited in
/// lexical order. Every call to [`TemplateWalker::walk`] starts over.
#[derive(Debug, Clone)]
pub struct TemplateWalker {
    root: PathBuf,
}

impl TemplateWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield every node below the root. File contents are read as each node is produced.
    pub fn walk(&self) -> impl Iterator<Item = TemplateResult<TemplateNode>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| -> TemplateResult<TemplateNode> {
                let entry = entry?;
                let source_path = entry.path().to_path_buf();
                let relative_path = source_path
                    .strip_prefix(&self.root)
                    .unwrap_or(&source_path)
                    .to_path_buf();

                let kind = if entry.file_type().is_dir() {
                    NodeKind::Directory
                } else {
                    NodeKind::File {
                        content: fs::read(&source_path)?,
                    }
                };

                Ok(TemplateNode {
                    relative_path,
                    source_path,
                    kind,
                })
            })
    }
}
