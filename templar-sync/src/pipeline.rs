//! Shared pipeline entrypoints used by the CLI.

use std::path::{Path, PathBuf};

use chrono::Local;

use templar_controller::{export_all, Controller, RetryPolicy};
use templar_core::{ExportStats, RestoreStats, TemplateKey};

use crate::error::SyncError;
use crate::git::VersionControl;
use crate::layout::WorkLayout;
use crate::reconcile::reconcile;
use crate::restore::{
    build_project_payloads, create_missing_projects, import_payloads, payloads_to_json,
};
use crate::synchronizer::{apply, SyncOptions, SyncOutcome};
use crate::writer::{stage_records, write_json};

/// Result of one export run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub stats: ExportStats,
    pub outcome: SyncOutcome,
    /// Repository templates the controller no longer has.
    pub deletions: Vec<TemplateKey>,
}

/// Export everything from `controller`, reconcile it with the working copy
/// behind `vcs` and, unless comparison-only, commit and push the difference.
///
/// The staging tree under `layout` is rebuilt from scratch.
pub fn run_export<C, V>(
    controller: &C,
    vcs: &mut V,
    layout: &WorkLayout,
    export_policy: &RetryPolicy,
    options: &SyncOptions,
) -> Result<ExportReport, SyncError>
where
    C: Controller + ?Sized,
    V: VersionControl + ?Sized,
{
    let mut stats = ExportStats::default();
    let export = export_all(controller, export_policy)?;
    stats.controller_projects = export.projects.len();
    stats.rejected_templates = export.rejected;
    tracing::info!("exported {} template(s)", export.records.len());

    let staging = layout.reset_staging()?;
    let repo_root = vcs.workdir().to_path_buf();
    let plan = reconcile(&repo_root, export.records, &mut stats)?;
    stage_records(&staging, &plan.writes)?;

    let outcome = apply(vcs, &staging, &plan, options, &mut stats)?;
    Ok(ExportReport {
        stats,
        outcome,
        deletions: plan.deletions.into_iter().collect(),
    })
}

/// Result of one restore run.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub stats: RestoreStats,
    /// Where the assembled payloads were dumped, when requested.
    pub payload_dump: Option<PathBuf>,
}

/// Push every template in the working copy at `repo_root` to `controller`.
///
/// When `dump_dir` is set the import payloads are also written there as
/// `project_payload_<timestamp>.json`.
pub fn run_restore<C: Controller + ?Sized>(
    controller: &C,
    repo_root: &Path,
    task_policy: &RetryPolicy,
    dump_dir: Option<&Path>,
) -> Result<RestoreReport, SyncError> {
    let mut stats = RestoreStats::default();
    let payloads = build_project_payloads(repo_root, &mut stats)?;
    tracing::info!(
        "repository holds {} template(s) in {} project(s)",
        stats.repository_templates,
        stats.repository_projects
    );

    let payload_dump = match dump_dir {
        Some(dir) => {
            let path = dir.join(format!(
                "project_payload_{}.json",
                Local::now().format("%Y%m%d-%H%M%S")
            ));
            write_json(&path, &payloads_to_json(&payloads))?;
            tracing::info!("import payloads written to {}", path.display());
            Some(path)
        }
        None => None,
    };

    create_missing_projects(controller, &payloads, task_policy, &mut stats)?;
    import_payloads(controller, &payloads, task_policy, &mut stats);
    Ok(RestoreReport {
        stats,
        payload_dump,
    })
}
