//! # templar-sync
//!
//! Reconciliation of exported templates with the git mirror, and the
//! inverse restore path.
//!
//! Call [`run_export`] with a connected controller and a cloned working copy
//! to bring the mirror up to date, or [`run_restore`] to import the mirror's
//! templates back into a controller.

pub mod diff;
pub mod error;
pub mod git;
pub mod layout;
pub mod pipeline;
pub mod reconcile;
pub mod restore;
pub mod synchronizer;
pub mod writer;

pub use error::SyncError;
pub use git::{redact_url_credentials, GitRepository, VersionControl};
pub use layout::{scan_templates, WorkLayout};
pub use pipeline::{run_export, run_restore, ExportReport, RestoreReport};
pub use reconcile::{deletion_set, reconcile, Classification, Reconciliation, Reconciler};
pub use restore::{build_project_payloads, ProjectPayloads};
pub use synchronizer::{commit_message, SyncOptions, SyncOutcome};
