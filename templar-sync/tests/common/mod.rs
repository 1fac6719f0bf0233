#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;
use templar_controller::RetryPolicy;
use templar_core::TemplateRecord;
use templar_sync::{SyncError, SyncOptions, VersionControl};

pub fn record(project: &str, name: &str, content: &str) -> TemplateRecord {
    TemplateRecord::try_from(json!({
        "projectName": project,
        "name": name,
        "templateContent": content,
        "language": "VELOCITY",
        "deviceTypes": [
            {"productFamily": "Switches and Hubs"},
            {"productFamily": "Routers"}
        ],
    }))
    .expect("valid record")
}

/// Store `record` in the mirror layout under `root`.
pub fn store(root: &Path, record: &TemplateRecord) {
    let path = root.join(record.key().relative_path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        path,
        serde_json::to_string_pretty(&record.to_document()).expect("render"),
    )
    .expect("write");
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(Duration::ZERO, 5)
}

pub fn options(compare_only: bool) -> SyncOptions {
    SyncOptions {
        compare_only,
        provenance: "integration".to_string(),
    }
}

/// A working copy that records calls instead of running git.
///
/// `remove` deletes the file from disk so the tree reflects the sync.
#[derive(Debug)]
pub struct RecordingVcs {
    pub workdir: PathBuf,
    pub removed: Vec<PathBuf>,
    pub staged: Vec<String>,
    pub commits: Vec<String>,
    pub pushes: usize,
}

impl RecordingVcs {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            removed: Vec::new(),
            staged: Vec::new(),
            commits: Vec::new(),
            pushes: 0,
        }
    }
}

impl VersionControl for RecordingVcs {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn remove(&mut self, rel: &Path) -> Result<(), SyncError> {
        let _ = fs::remove_file(self.workdir.join(rel));
        self.removed.push(rel.to_path_buf());
        Ok(())
    }

    fn stage(&mut self, pathspec: &str) -> Result<(), SyncError> {
        self.staged.push(pathspec.to_string());
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<bool, SyncError> {
        self.commits.push(message.to_string());
        Ok(true)
    }

    fn push(&mut self) -> Result<(), SyncError> {
        self.pushes += 1;
        Ok(())
    }
}
