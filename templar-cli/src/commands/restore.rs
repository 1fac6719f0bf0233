//! `templar restore`: repository → controller.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;

use templar_controller::RetryPolicy;
use templar_sync::{run_restore, VersionControl};

use super::{load_settings, open_session, summary};

/// Arguments for `templar restore`.
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Log intermediate state and dump the import payloads to the work dir.
    #[arg(short, long)]
    pub verbose: bool,

    /// Trace controller requests and responses.
    #[arg(short = 'd', long, alias = "debug_api")]
    pub debug_api: bool,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RestoreArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let settings = load_settings(config)?;
        let audit_path = audit_log_path(&settings.work_dir, Local::now());
        let audit_log = open_audit_log(&audit_path)?;
        crate::init_tracing(self.verbose, self.debug_api, Some(audit_log));
        tracing::info!("restore started, audit log at {}", audit_path.display());

        let session = open_session(settings)?;

        let policy = RetryPolicy::from(session.settings.task_poll);
        let dump_dir = self.verbose.then(|| session.layout.root());
        let report = run_restore(
            session.controller.as_ref(),
            session.repo.workdir(),
            &policy,
            dump_dir,
        )
        .context("restore failed")?;

        summary::print_restore(&report, self.json)
    }
}

/// `<work_dir>/templar_restore_<YYYYmmdd-HHMMSS>.log`
fn audit_log_path(work_dir: &Path, now: DateTime<Local>) -> PathBuf {
    work_dir.join(format!("templar_restore_{}.log", now.format("%Y%m%d-%H%M%S")))
}

fn open_audit_log(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open audit log {}", path.display()))
}
