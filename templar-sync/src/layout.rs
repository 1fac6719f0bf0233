//! Working-directory layout and template tree scanning.
//!
//! # Layout
//!
//! ```text
//! <work_dir>/
//!   staging/projects/<project>/<template>.json   (rebuilt every run)
//!   repo/                                        (fresh clone every run)
//!     projects/<project>/<template>.json
//! ```
//!
//! Staging and clone hold the same relative paths, so a [`TemplateKey`]
//! addresses a file in either tree.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use templar_core::types::{PROJECTS_DIR, TEMPLATE_EXT};
use templar_core::TemplateKey;

use crate::error::{io_err, json_err, SyncError};

/// Paths of one run's scratch area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    root: PathBuf,
}

impl WorkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of the staging tree (parent of its `projects/`).
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Where the repository is cloned.
    pub fn clone_dir(&self) -> PathBuf {
        self.root.join("repo")
    }

    /// Wipe and recreate the staging tree. Leftovers from an earlier run
    /// would otherwise be copied into the repository again.
    pub fn reset_staging(&self) -> Result<PathBuf, SyncError> {
        let dir = self.staging_dir();
        remove_dir_if_exists(&dir)?;
        let projects = dir.join(PROJECTS_DIR);
        std::fs::create_dir_all(&projects).map_err(|e| io_err(&projects, e))?;
        Ok(dir)
    }

    /// Remove any previous clone so the next clone starts clean.
    pub fn reset_clone_dir(&self) -> Result<PathBuf, SyncError> {
        let dir = self.clone_dir();
        if dir.exists() {
            tracing::info!("removing existing repository directory {}", dir.display());
        }
        remove_dir_if_exists(&dir)?;
        std::fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
        Ok(dir)
    }
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), SyncError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(dir, err)),
    }
}

/// Every `projects/<project>/<name>.json` file under `root`.
///
/// Only the two-level layout counts; stray files at other depths or with
/// other extensions are ignored. A missing `projects/` directory is an
/// empty tree.
pub fn scan_templates(root: &Path) -> Result<BTreeSet<TemplateKey>, SyncError> {
    let projects_dir = root.join(PROJECTS_DIR);
    let mut keys = BTreeSet::new();
    if !projects_dir.is_dir() {
        return Ok(keys);
    }

    let entries = std::fs::read_dir(&projects_dir).map_err(|e| io_err(&projects_dir, e))?;
    for project_entry in entries.filter_map(|e| e.ok()) {
        if !project_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Some(project) = project_entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };

        let project_path = project_entry.path();
        let files = std::fs::read_dir(&project_path).map_err(|e| io_err(&project_path, e))?;
        for file_entry in files.filter_map(|e| e.ok()) {
            if !file_entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = file_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            keys.insert(TemplateKey::new(project.as_str(), name));
        }
    }
    Ok(keys)
}

/// Parse the JSON document at `path`; `Ok(None)` when the file is absent.
pub fn read_document(path: &Path) -> Result<Option<Value>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| json_err(path, e)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}
