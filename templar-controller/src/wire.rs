//! Response envelopes of the controller's REST API.
//!
//! Kept free of I/O so both adapters share them and tests can feed canned
//! bodies.

use serde_json::Value;

use templar_core::{ProjectSummary, TaskId, TaskStatus};

use crate::error::{unexpected, ControllerError};

/// `{"Token": "..."}` from the auth endpoint.
pub(crate) fn parse_token(endpoint: &str, body: &Value) -> Result<String, ControllerError> {
    body.get("Token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| unexpected(endpoint, "missing `Token`"))
}

/// `{"response": {"taskId": "...", "url": "..."}}` from any async endpoint.
pub(crate) fn parse_task_handle(endpoint: &str, body: &Value) -> Result<TaskId, ControllerError> {
    body.get("response")
        .and_then(|r| r.get("taskId"))
        .and_then(Value::as_str)
        .map(TaskId::from)
        .ok_or_else(|| unexpected(endpoint, "missing `response.taskId`"))
}

/// `{"response": {...task...}}` from the task endpoint.
pub(crate) fn parse_task_status(endpoint: &str, body: Value) -> Result<TaskStatus, ControllerError> {
    let Value::Object(mut map) = body else {
        return Err(unexpected(endpoint, "task status is not an object"));
    };
    let response = map
        .remove("response")
        .ok_or_else(|| unexpected(endpoint, "missing `response`"))?;
    Ok(serde_json::from_value(response)?)
}

/// Project listing, either a bare array or wrapped in `{"response": [...]}`.
pub(crate) fn parse_projects(
    endpoint: &str,
    body: Value,
) -> Result<Vec<ProjectSummary>, ControllerError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => map
            .remove("response")
            .filter(Value::is_array)
            .ok_or_else(|| unexpected(endpoint, "missing `response` array"))?,
        _ => return Err(unexpected(endpoint, "project listing is not a list")),
    };
    Ok(serde_json::from_value(list)?)
}
