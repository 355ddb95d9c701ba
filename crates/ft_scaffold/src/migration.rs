//! Revision chaining for scaffolded Alembic migrations.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ScaffoldResult;

/// Where migration scripts live, relative to the project root.
pub const VERSIONS_DIR: &str = "migrations/versions";

/// Revision declared by one migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub path: PathBuf,
    pub id: String,
    pub parents: Vec<String>,
}

/// Read `revision` and `down_revision` from every script in the versions
/// directory, in file name order. Scripts without a revision are skipped.
pub fn revisions(project_root: &Path) -> ScaffoldResult<Vec<Revision>> {
    let dir = project_root.join(VERSIONS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let revision_pattern = Regex::new(r#"(?m)^revision\s*=\s*["']([^"']+)["']"#)
        .expect("revision pattern is a valid regex");
    let down_pattern = Regex::new(r"(?m)^down_revision\s*=\s*(.*)$")
        .expect("down revision pattern is a valid regex");
    let quoted = Regex::new(r#"["']([^"']+)["']"#).expect("quoted pattern is a valid regex");

    let mut paths = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut found = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)?;
        let Some(id) = revision_pattern.captures(&text).map(|c| c[1].to_string()) else {
            debug!("No revision in {:?}", path);
            continue;
        };
        let parents = down_pattern
            .captures(&text)
            .map(|c| {
                quoted
                    .captures_iter(&c[1])
                    .map(|q| q[1].to_string())
                    .collect()
            })
            .unwrap_or_default();
        found.push(Revision { path, id, parents });
    }
    Ok(found)
}

/// The revision a new migration should follow: the chain head, or `None`
/// for an empty history. With several heads the one in the last file wins.
pub fn head_revision(project_root: &Path) -> ScaffoldResult<Option<String>> {
    let revisions = revisions(project_root)?;
    let heads: Vec<&Revision> = revisions
        .iter()
        .filter(|r| !revisions.iter().any(|other| other.parents.contains(&r.id)))
        .collect();

    if heads.len() > 1 {
        warn!(
            "Migration history has {} heads; chaining onto {:?}",
            heads.len(),
            heads.last().map(|r| &r.path)
        );
    }
    Ok(heads.last().map(|r| r.id.clone()))
}

/// Python literal for a `down_revision` assignment.
pub fn down_revision_literal(parent: Option<&str>) -> String {
    match parent {
        Some(id) => format!("\"{id}\""),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn script(root: &Path, name: &str, revision: &str, down: &str) {
        let dir = root.join(VERSIONS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(name),
            format!("\"\"\"x\"\"\"\n\nrevision = \"{revision}\"\ndown_revision = {down}\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_empty_history() {
        let temp = tempdir().unwrap();
        assert_eq!(head_revision(temp.path()).unwrap(), None);
        fs::create_dir_all(temp.path().join(VERSIONS_DIR)).unwrap();
        fs::write(temp.path().join(VERSIONS_DIR).join(".gitkeep"), "").unwrap();
        assert_eq!(head_revision(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_head_follows_chain_not_file_order() {
        let temp = tempdir().unwrap();
        script(temp.path(), "0001_create_users.py", "0001", "None");
        script(temp.path(), "a_second.py", "20240504100000", "\"0001\"");
        script(temp.path(), "0002_third.py", "20240505100000", "'20240504100000'");

        assert_eq!(head_revision(temp.path()).unwrap().as_deref(), Some("20240505100000"));
        let parents: Vec<Vec<String>> = revisions(temp.path())
            .unwrap()
            .into_iter()
            .map(|r| r.parents)
            .collect();
        assert_eq!(parents[0], Vec::<String>::new());
        assert_eq!(parents[1], vec!["20240504100000".to_string()]);
    }

    #[test]
    fn test_down_revision_literal() {
        assert_eq!(down_revision_literal(None), "None");
        assert_eq!(down_revision_literal(Some("0001")), "\"0001\"");
    }
}
