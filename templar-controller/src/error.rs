//! Error types for templar-controller.

use thiserror::Error;

use templar_core::{RecordError, TaskId};

/// All errors that can arise from talking to the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The controller answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or protocol failure before a response arrived.
    #[error("request to {endpoint} failed: {detail}")]
    Transport { endpoint: String, detail: String },

    /// The response body could not be read.
    #[error("failed to read response from {endpoint}: {source}")]
    Body {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The response was JSON, but not in the expected shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    UnexpectedResponse { endpoint: String, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid template record: {0}")]
    Record(#[from] RecordError),

    /// The export task never reached a terminal state. Partial export data
    /// is unusable, so callers treat this as fatal.
    #[error("export task {task_id} did not complete after {attempts} polls")]
    ExportTimedOut { task_id: TaskId, attempts: u32 },

    /// The export task finished without a result payload.
    #[error("export task {task_id} completed without result data")]
    MissingTaskData { task_id: TaskId },
}

pub(crate) fn unexpected(endpoint: &str, detail: impl Into<String>) -> ControllerError {
    ControllerError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        detail: detail.into(),
    }
}
