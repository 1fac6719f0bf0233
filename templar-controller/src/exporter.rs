//! Bulk template export.
//!
//! One export task covers every template on the controller. The task's
//! `data` field is itself a serialized JSON array of template records.

use serde_json::Value;

use templar_core::{ProjectSummary, RecordError, TaskId, TemplateId, TemplateRecord};

use crate::api::Controller;
use crate::error::ControllerError;
use crate::poller::{poll_task, PollOutcome, RetryPolicy};

/// Everything one export pass produced.
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub projects: Vec<ProjectSummary>,
    pub records: Vec<TemplateRecord>,
    /// Records dropped because a name would not map onto the mirror layout.
    pub rejected: usize,
}

/// Identifiers of every template in `projects`. Entries without an id are
/// skipped.
pub fn collect_template_ids(projects: &[ProjectSummary]) -> Vec<TemplateId> {
    projects
        .iter()
        .flat_map(|p| p.templates.iter())
        .filter_map(|t| t.id.clone())
        .collect()
}

/// List projects, export all their templates and wait for the result.
///
/// Poll exhaustion is returned as [`ControllerError::ExportTimedOut`]: a
/// partial export cannot be reconciled safely.
pub fn export_all<C: Controller + ?Sized>(
    controller: &C,
    policy: &RetryPolicy,
) -> Result<Export, ControllerError> {
    let projects = controller.list_projects()?;
    tracing::info!("controller reports {} project(s)", projects.len());
    tracing::debug!(
        "projects:\n{}",
        serde_json::to_string_pretty(&projects).unwrap_or_default()
    );
    if projects.is_empty() {
        return Ok(Export::default());
    }

    let ids = collect_template_ids(&projects);
    let task_id = controller.export_templates(&ids)?;
    tracing::info!("export of {} template(s) requested, task {task_id}", ids.len());

    let status = match poll_task(controller, &task_id, policy)? {
        PollOutcome::Completed(status) => status,
        PollOutcome::TimedOut { attempts } => {
            return Err(ControllerError::ExportTimedOut { task_id, attempts })
        }
    };
    tracing::debug!(
        "export result:\n{}",
        serde_json::to_string_pretty(&status).unwrap_or_default()
    );

    let (records, rejected) = parse_export_data(&task_id, status.data.as_deref())?;
    Ok(Export {
        projects,
        records,
        rejected,
    })
}

/// Records from the task result, plus how many were skipped for unusable
/// names. Any other malformed record fails the export.
fn parse_export_data(
    task_id: &TaskId,
    data: Option<&str>,
) -> Result<(Vec<TemplateRecord>, usize), ControllerError> {
    let data = data.ok_or_else(|| ControllerError::MissingTaskData {
        task_id: task_id.clone(),
    })?;
    let entries: Vec<Value> = serde_json::from_str(data)?;
    let mut records = Vec::with_capacity(entries.len());
    let mut rejected = 0;
    for entry in entries {
        match TemplateRecord::try_from(entry) {
            Ok(record) => records.push(record),
            Err(err @ RecordError::InvalidName { .. }) => {
                tracing::warn!("skipping exported template: {err}");
                rejected += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok((records, rejected))
}
