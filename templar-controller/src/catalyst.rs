//! Catalyst Center (2.3.7.x) adapter.
//!
//! Same template-programmer family as DNA Center, but the project listing
//! with nested templates lives under the v2 API and is wrapped in a
//! `{"response": [...]}` envelope.

use templar_core::{ProjectName, ProjectSummary, TaskId, TaskStatus, TemplateId, TemplateRecord};

use crate::api::Controller;
use crate::error::ControllerError;
use crate::http::Session;
use crate::wire::parse_projects;

const PROJECTS_PATH: &str = "/dna/intent/api/v2/template-programmer/project";

pub struct CatalystController {
    session: Session,
}

impl CatalystController {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl Controller for CatalystController {
    fn list_projects(&self) -> Result<Vec<ProjectSummary>, ControllerError> {
        parse_projects(PROJECTS_PATH, self.session.get(PROJECTS_PATH)?)
    }

    fn export_templates(&self, ids: &[TemplateId]) -> Result<TaskId, ControllerError> {
        self.session.export_templates(ids)
    }

    fn import_templates(
        &self,
        project: &ProjectName,
        templates: &[TemplateRecord],
    ) -> Result<TaskId, ControllerError> {
        self.session.import_templates(project, templates)
    }

    fn create_project(&self, name: &ProjectName) -> Result<TaskId, ControllerError> {
        self.session.create_project(name)
    }

    fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, ControllerError> {
        self.session.task_status(task_id)
    }
}
