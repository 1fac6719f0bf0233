//! Error types for templar-sync.

use std::path::PathBuf;

use thiserror::Error;

use templar_controller::ControllerError;

/// All errors that can arise from reconcile, sync and restore operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the controller client.
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template document could not be serialized or parsed.
    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `git` invocation failed. Credentials are redacted from `detail`.
    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Json`].
pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> SyncError {
    SyncError::Json {
        path: path.into(),
        source,
    }
}
