//! Template reconciliation between the controller and the repository.
//!
//! Each exported record is classified against the repository clone:
//!
//! - **new**: no file at the record's key; always written, never compared.
//! - **changed**: the file differs under order-insensitive equality (or is
//!   unreadable JSON); written.
//! - **unchanged**: structurally equal; nothing to do.
//!
//! After every record has been observed, the deletion set is the pure set
//! difference `repository_keys − controller_keys`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use templar_core::json_eq::unordered_eq;
use templar_core::{ExportStats, TemplateKey, TemplateRecord};

use crate::diff::unified_json_diff;
use crate::error::SyncError;
use crate::layout::{read_document, scan_templates};

/// Verdict for one exported record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Unchanged,
    Changed,
    New,
}

/// Outcome of a full reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Records whose document must be (re)written, in export order.
    pub writes: Vec<TemplateRecord>,
    /// Repository files the controller no longer knows about.
    pub deletions: BTreeSet<TemplateKey>,
    pub controller_keys: BTreeSet<TemplateKey>,
    pub repository_keys: BTreeSet<TemplateKey>,
}

impl Reconciliation {
    /// `true` when applying this reconciliation would touch the repository.
    pub fn has_changes(&self) -> bool {
        !self.writes.is_empty() || !self.deletions.is_empty()
    }
}

/// `repository_keys − controller_keys`.
pub fn deletion_set(
    repository_keys: &BTreeSet<TemplateKey>,
    controller_keys: &BTreeSet<TemplateKey>,
) -> BTreeSet<TemplateKey> {
    repository_keys.difference(controller_keys).cloned().collect()
}

/// Incremental reconciler over one repository clone.
#[derive(Debug)]
pub struct Reconciler {
    repo_root: PathBuf,
    repository_keys: BTreeSet<TemplateKey>,
    controller_keys: BTreeSet<TemplateKey>,
    writes: Vec<TemplateRecord>,
}

impl Reconciler {
    /// Scan `repo_root` for the repository key set.
    pub fn new(repo_root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let repo_root = repo_root.into();
        let repository_keys = scan_templates(&repo_root)?;
        tracing::debug!(
            "repository templates ({}): {:?}",
            repository_keys.len(),
            display_keys(&repository_keys)
        );
        Ok(Self {
            repo_root,
            repository_keys,
            controller_keys: BTreeSet::new(),
            writes: Vec::new(),
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Classify `record` and stage it for writing when needed.
    pub fn observe(
        &mut self,
        record: TemplateRecord,
        stats: &mut ExportStats,
    ) -> Result<Classification, SyncError> {
        stats.controller_templates += 1;
        let key = record.key();
        self.controller_keys.insert(key.clone());

        let path = self.repo_root.join(key.relative_path());
        let exported = record.to_document();
        let classification = match read_document(&path) {
            Ok(Some(stored)) => {
                stats.templates_compared += 1;
                if unordered_eq(&exported, &stored) {
                    Classification::Unchanged
                } else {
                    stats.changed_templates += 1;
                    if tracing::enabled!(tracing::Level::DEBUG) {
                        tracing::debug!(
                            "diff for {key}:\n{}",
                            unified_json_diff(&key, &stored, &exported)
                        );
                    }
                    Classification::Changed
                }
            }
            Ok(None) => {
                stats.new_templates += 1;
                tracing::debug!("{key} does not exist in the repository");
                Classification::New
            }
            Err(SyncError::Json { path, source }) => {
                stats.templates_compared += 1;
                stats.changed_templates += 1;
                tracing::warn!(
                    "{} is not valid JSON ({source}); it will be overwritten",
                    path.display()
                );
                Classification::Changed
            }
            Err(err) => return Err(err),
        };

        tracing::debug!("{key}: {classification:?}");
        if classification != Classification::Unchanged {
            self.writes.push(record);
        }
        Ok(classification)
    }

    /// Close the pass and compute the deletion set.
    pub fn finish(self) -> Reconciliation {
        let deletions = deletion_set(&self.repository_keys, &self.controller_keys);
        tracing::debug!(
            "controller templates ({}): {:?}",
            self.controller_keys.len(),
            display_keys(&self.controller_keys)
        );
        tracing::debug!(
            "templates to delete ({}): {:?}",
            deletions.len(),
            display_keys(&deletions)
        );
        Reconciliation {
            writes: self.writes,
            deletions,
            controller_keys: self.controller_keys,
            repository_keys: self.repository_keys,
        }
    }
}

/// Reconcile every record against the clone at `repo_root`.
pub fn reconcile(
    repo_root: &Path,
    records: impl IntoIterator<Item = TemplateRecord>,
    stats: &mut ExportStats,
) -> Result<Reconciliation, SyncError> {
    let mut reconciler = Reconciler::new(repo_root)?;
    for record in records {
        reconciler.observe(record, stats)?;
    }
    Ok(reconciler.finish())
}

fn display_keys(keys: &BTreeSet<TemplateKey>) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}
