//! templar: mirror controller configuration templates into git and back.
//!
//! # Usage
//!
//! ```text
//! templar [--config <path>] export [--compare-only] [--verbose] [--json]
//! templar [--config <path>] restore [--verbose] [--debug-api] [--json]
//! ```
//!
//! Controller and repository credentials come from the environment; see
//! `templar_core::config` for the accepted variable names.

mod commands;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{export::ExportArgs, restore::RestoreArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templar",
    version,
    about = "Mirror DNA Center / Catalyst Center templates into a git repository",
    long_about = None,
)]
struct Cli {
    /// Settings file (defaults to <config dir>/templar/config.yaml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export all templates, diff them against the repository and commit the changes.
    Export(ExportArgs),

    /// Import every template in the repository back into the controller.
    Restore(RestoreArgs),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the stderr subscriber, plus a plain-text copy into `audit_log`
/// when given. `RUST_LOG` wins over the flags.
pub(crate) fn init_tracing(verbose: bool, debug_api: bool, audit_log: Option<File>) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let mut directives = String::from(if verbose { "debug" } else { "info" });
    if debug_api {
        directives.push_str(",templar_controller=trace");
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));
    let audit_layer = audit_log.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(audit_layer)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Export(args) => args.run(config),
        Commands::Restore(args) => args.run(config),
    }
}
