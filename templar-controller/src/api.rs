//! The controller capability surface.
//!
//! Everything above this trait (exporter, poller, restorer) is written
//! against [`Controller`]; each backend flavor provides one adapter.

use templar_core::{ProjectName, ProjectSummary, TaskId, TaskStatus, TemplateId, TemplateRecord};

use crate::error::ControllerError;

/// Operations the sync pipelines need from a controller.
pub trait Controller {
    /// All projects with their nested template identifiers.
    fn list_projects(&self) -> Result<Vec<ProjectSummary>, ControllerError>;

    /// Start a bulk export of the given templates.
    fn export_templates(&self, ids: &[TemplateId]) -> Result<TaskId, ControllerError>;

    /// Start a bulk import of `templates` into `project` (no versioning).
    fn import_templates(
        &self,
        project: &ProjectName,
        templates: &[TemplateRecord],
    ) -> Result<TaskId, ControllerError>;

    /// Start creation of an empty project.
    fn create_project(&self, name: &ProjectName) -> Result<TaskId, ControllerError>;

    fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, ControllerError>;
}
