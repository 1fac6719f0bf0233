//! Applying a reconciliation to the repository working copy.

use std::path::Path;

use chrono::{DateTime, Local};

use templar_core::types::PROJECTS_DIR;
use templar_core::{ExportStats, TemplateKey};

use crate::error::SyncError;
use crate::git::VersionControl;
use crate::reconcile::Reconciliation;
use crate::writer::copy_into_repo;

/// Knobs for one synchronizing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Reconcile and stage, but never touch the repository.
    pub compare_only: bool,
    /// Automation name recorded in the commit message.
    pub provenance: String,
}

/// What the synchronizer did with the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Comparison-only run; the repository was left alone.
    CompareOnly,
    /// Nothing new, changed or deleted.
    NoChanges,
    /// Files were copied/removed but the index ended up identical to HEAD.
    NothingToCommit,
    /// A commit was created and pushed.
    Pushed { message: String },
}

/// `Templates updated by <provenance> - <timestamp>`.
pub fn commit_message(provenance: &str, at: DateTime<Local>) -> String {
    format!(
        "Templates updated by {provenance} - {}",
        at.format("%Y-%m-%d %I:%M:%S%p %Z")
    )
}

/// Copy staged writes, remove deleted templates, commit and push.
///
/// `staging_root` must hold every record in `plan.writes` at its relative
/// path (see [`crate::writer::stage_records`]).
pub fn apply<V: VersionControl + ?Sized>(
    vcs: &mut V,
    staging_root: &Path,
    plan: &Reconciliation,
    options: &SyncOptions,
    stats: &mut ExportStats,
) -> Result<SyncOutcome, SyncError> {
    if options.compare_only {
        tracing::info!(
            "compare-only: {} template(s) to write, {} to delete; repository untouched",
            plan.writes.len(),
            plan.deletions.len()
        );
        return Ok(SyncOutcome::CompareOnly);
    }
    if !plan.has_changes() {
        tracing::info!("no template changes detected");
        return Ok(SyncOutcome::NoChanges);
    }

    let keys: Vec<TemplateKey> = plan.writes.iter().map(|r| r.key()).collect();
    let repo_root = vcs.workdir().to_path_buf();
    copy_into_repo(staging_root, &repo_root, &keys, stats);

    stats.files_deleted = plan.deletions.len();
    for key in &plan.deletions {
        vcs.remove(&key.relative_path())?;
    }

    vcs.stage(PROJECTS_DIR)?;
    let message = commit_message(&options.provenance, Local::now());
    if !vcs.commit(&message)? {
        return Ok(SyncOutcome::NothingToCommit);
    }
    vcs.push()?;
    Ok(SyncOutcome::Pushed { message })
}
