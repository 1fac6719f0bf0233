//! `templar export`: controller → repository.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use templar_controller::RetryPolicy;
use templar_sync::{run_export, SyncOptions, SyncOutcome};

use super::{load_settings, open_session, summary};

/// Arguments for `templar export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Report differences without committing or pushing anything.
    #[arg(short = 'c', long, alias = "compare_only")]
    pub compare_only: bool,

    /// Log intermediate state, including per-template diffs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        crate::init_tracing(self.verbose, false, None);
        let mut session = open_session(load_settings(config)?)?;

        let options = SyncOptions {
            compare_only: self.compare_only,
            provenance: session.settings.provenance.clone(),
        };
        let policy = RetryPolicy::from(session.settings.export_poll);
        let report = run_export(
            session.controller.as_ref(),
            &mut session.repo,
            &session.layout,
            &policy,
            &options,
        )
        .context("export failed")?;

        let browse_url = match report.outcome {
            SyncOutcome::Pushed { .. } => {
                let url = session.settings.browse_url();
                tracing::info!("changes pushed, browse them at {url}");
                Some(url)
            }
            _ => None,
        };
        summary::print_export(&report, browse_url.as_deref(), self.json)
    }
}
