//! In-memory [`Controller`] for test suites.
//!
//! Behaves like a small controller: projects hold templates, every mutating
//! call creates a task, and tasks complete after a configurable number of
//! status fetches. Failure modes are opted into per project.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{json, Value};

use templar_core::{
    ProjectName, ProjectSummary, TaskId, TaskStatus, TemplateId, TemplateRecord, TemplateSummary,
};

use crate::api::Controller;
use crate::error::ControllerError;

#[derive(Debug, Clone)]
struct StoredTemplate {
    id: Option<TemplateId>,
    record: TemplateRecord,
}

#[derive(Debug, Clone)]
struct TaskEntry {
    fetches: u32,
    polls_needed: u32,
    failure_reason: Option<String>,
    data: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    projects: BTreeMap<ProjectName, Vec<StoredTemplate>>,
    next_id: u64,
    tasks: HashMap<TaskId, TaskEntry>,
    export_requests: Vec<Vec<TemplateId>>,
    imports: Vec<(ProjectName, usize)>,
    created: Vec<ProjectName>,
    /// Export entries that bypass record validation.
    raw: Vec<(ProjectName, TemplateId, Value)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn upsert(&mut self, record: TemplateRecord, with_id: bool) {
        let id = with_id.then(|| TemplateId(self.next_id("tmpl")));
        let templates = self.projects.entry(record.project().clone()).or_default();
        templates.retain(|t| t.record.name() != record.name());
        templates.push(StoredTemplate { id, record });
    }
}

/// A scriptable controller that lives entirely in memory.
#[derive(Debug)]
pub struct MemoryController {
    state: RefCell<State>,
    polls_until_complete: u32,
    stuck_exports: bool,
    failing_projects: BTreeSet<ProjectName>,
    rejected_projects: BTreeSet<ProjectName>,
}

impl Default for MemoryController {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryController {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            polls_until_complete: 1,
            stuck_exports: false,
            failing_projects: BTreeSet::new(),
            rejected_projects: BTreeSet::new(),
        }
    }

    /// Add an (empty) project.
    pub fn with_project(self, name: impl Into<ProjectName>) -> Self {
        self.state
            .borrow_mut()
            .projects
            .entry(name.into())
            .or_default();
        self
    }

    /// Add a template (creating its project) with a controller id.
    pub fn with_template(self, record: TemplateRecord) -> Self {
        self.state.borrow_mut().upsert(record, true);
        self
    }

    /// Add a template whose listing entry carries no id.
    pub fn with_template_without_id(self, record: TemplateRecord) -> Self {
        self.state.borrow_mut().upsert(record, false);
        self
    }

    /// List `body` under `project` and return it verbatim from exports,
    /// without checking that it forms a valid record.
    pub fn with_raw_template(self, project: impl Into<ProjectName>, body: Value) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let project = project.into();
            let id = TemplateId(state.next_id("raw"));
            state.projects.entry(project.clone()).or_default();
            state.raw.push((project, id, body));
        }
        self
    }

    /// Tasks complete on the `n`-th status fetch.
    pub fn with_polls_until_complete(mut self, n: u32) -> Self {
        self.polls_until_complete = n.max(1);
        self
    }

    /// Export tasks never reach an end time.
    pub fn with_stuck_exports(mut self) -> Self {
        self.stuck_exports = true;
        self
    }

    /// Create/import tasks for `project` complete with the error flag set.
    pub fn with_failing_project(mut self, project: impl Into<ProjectName>) -> Self {
        self.failing_projects.insert(project.into());
        self
    }

    /// Create/import requests for `project` are refused outright.
    pub fn with_rejected_project(mut self, project: impl Into<ProjectName>) -> Self {
        self.rejected_projects.insert(project.into());
        self
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn project_names(&self) -> Vec<ProjectName> {
        self.state.borrow().projects.keys().cloned().collect()
    }

    pub fn templates_in(&self, project: &ProjectName) -> Vec<TemplateRecord> {
        self.state
            .borrow()
            .projects
            .get(project)
            .map(|ts| ts.iter().map(|t| t.record.clone()).collect())
            .unwrap_or_default()
    }

    pub fn status_fetches(&self, task_id: &TaskId) -> u32 {
        self.state
            .borrow()
            .tasks
            .get(task_id)
            .map(|t| t.fetches)
            .unwrap_or(0)
    }

    pub fn export_requests(&self) -> Vec<Vec<TemplateId>> {
        self.state.borrow().export_requests.clone()
    }

    /// `(project, template count)` per import call, in call order.
    pub fn imports(&self) -> Vec<(ProjectName, usize)> {
        self.state.borrow().imports.clone()
    }

    pub fn created_projects(&self) -> Vec<ProjectName> {
        self.state.borrow().created.clone()
    }

    fn new_task(&self, polls_needed: u32, failure_reason: Option<String>, data: Option<String>) -> TaskId {
        let mut state = self.state.borrow_mut();
        let id = TaskId(state.next_id("task"));
        state.tasks.insert(
            id.clone(),
            TaskEntry {
                fetches: 0,
                polls_needed,
                failure_reason,
                data,
            },
        );
        id
    }

    fn reject_if_configured(&self, project: &ProjectName, endpoint: &str) -> Result<(), ControllerError> {
        if self.rejected_projects.contains(project) {
            return Err(ControllerError::Status {
                endpoint: endpoint.to_string(),
                status: 500,
                body: format!("project {project} refused"),
            });
        }
        Ok(())
    }
}

impl Controller for MemoryController {
    fn list_projects(&self) -> Result<Vec<ProjectSummary>, ControllerError> {
        let state = self.state.borrow();
        let projects = state
            .projects
            .iter()
            .map(|(name, templates)| {
                let raw = state
                    .raw
                    .iter()
                    .filter(|(project, _, _)| project == name)
                    .map(|(_, id, body)| TemplateSummary {
                        id: Some(id.clone()),
                        name: body.get("name").and_then(Value::as_str).map(str::to_string),
                    });
                ProjectSummary {
                    name: name.clone(),
                    id: Some(format!("proj-{name}")),
                    templates: templates
                        .iter()
                        .map(|t| TemplateSummary {
                            id: t.id.clone(),
                            name: Some(t.record.name().to_string()),
                        })
                        .chain(raw)
                        .collect(),
                }
            })
            .collect();
        Ok(projects)
    }

    fn export_templates(&self, ids: &[TemplateId]) -> Result<TaskId, ControllerError> {
        let exported: Vec<Value> = {
            let mut state = self.state.borrow_mut();
            state.export_requests.push(ids.to_vec());
            ids.iter()
                .filter_map(|id| {
                    state
                        .projects
                        .values()
                        .flatten()
                        .find(|t| t.id.as_ref() == Some(id))
                        .map(|t| t.record.to_value())
                        .or_else(|| {
                            state
                                .raw
                                .iter()
                                .find(|(_, raw_id, _)| raw_id == id)
                                .map(|(_, _, body)| body.clone())
                        })
                })
                .collect()
        };
        let polls = if self.stuck_exports {
            u32::MAX
        } else {
            self.polls_until_complete
        };
        Ok(self.new_task(polls, None, Some(serde_json::to_string(&exported)?)))
    }

    fn import_templates(
        &self,
        project: &ProjectName,
        templates: &[TemplateRecord],
    ) -> Result<TaskId, ControllerError> {
        self.reject_if_configured(project, "importtemplates")?;
        let failure = {
            let mut state = self.state.borrow_mut();
            state.imports.push((project.clone(), templates.len()));
            if self.failing_projects.contains(project) {
                Some(format!("template import into {project} failed"))
            } else if !state.projects.contains_key(project) {
                Some(format!("project {project} does not exist"))
            } else {
                for record in templates {
                    state.upsert(record.clone(), true);
                }
                None
            }
        };
        Ok(self.new_task(self.polls_until_complete, failure, None))
    }

    fn create_project(&self, name: &ProjectName) -> Result<TaskId, ControllerError> {
        self.reject_if_configured(name, "project")?;
        let failure = if self.failing_projects.contains(name) {
            Some(format!("project {name} could not be created"))
        } else {
            let mut state = self.state.borrow_mut();
            state.projects.entry(name.clone()).or_default();
            state.created.push(name.clone());
            None
        };
        Ok(self.new_task(self.polls_until_complete, failure, None))
    }

    fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, ControllerError> {
        let mut state = self.state.borrow_mut();
        let Some(task) = state.tasks.get_mut(task_id) else {
            return Err(ControllerError::Status {
                endpoint: format!("task/{task_id}"),
                status: 404,
                body: "no such task".to_string(),
            });
        };
        task.fetches += 1;
        let complete = task.fetches >= task.polls_needed;
        Ok(TaskStatus {
            id: Some(task_id.clone()),
            end_time: complete.then(|| json!(task.fetches)),
            is_error: complete && task.failure_reason.is_some(),
            failure_reason: if complete {
                task.failure_reason.clone()
            } else {
                None
            },
            progress: Some(if complete { "done" } else { "running" }.to_string()),
            data: if complete { task.data.clone() } else { None },
        })
    }
}
