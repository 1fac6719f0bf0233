//! Rebuilding controller state from the repository.
//!
//! Repository files are grouped by their project directory into one import
//! payload per project. Missing projects are created first, then each group
//! is imported as a single task. Per-project failures are counted and the
//! run moves on to the next project.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::{json, Map, Value};

use templar_controller::{poll_task, Controller, PollOutcome, RetryPolicy};
use templar_core::{ProjectName, RestoreStats, TaskId, TemplateRecord};

use crate::error::SyncError;
use crate::layout::{read_document, scan_templates};

/// Template payloads keyed by project, in import order.
pub type ProjectPayloads = BTreeMap<ProjectName, Vec<TemplateRecord>>;

/// Group every `projects/<project>/<name>.json` under `repo_root` by project.
///
/// Unreadable or malformed files are logged, counted in
/// `unreadable_files` and left out of the payload.
pub fn build_project_payloads(
    repo_root: &Path,
    stats: &mut RestoreStats,
) -> Result<ProjectPayloads, SyncError> {
    let keys = scan_templates(repo_root)?;
    stats.repository_templates = keys.len();
    stats.repository_projects = keys
        .iter()
        .map(|k| &k.project)
        .collect::<BTreeSet<_>>()
        .len();

    let mut payloads = ProjectPayloads::new();
    for key in keys {
        let path = repo_root.join(key.relative_path());
        let doc = match read_document(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => continue,
            Err(err) => {
                stats.unreadable_files += 1;
                tracing::warn!("skipping {key}: {err}");
                continue;
            }
        };
        match TemplateRecord::from_document(doc) {
            Ok(record) => payloads.entry(key.project.clone()).or_default().push(record),
            Err(err) => {
                stats.unreadable_files += 1;
                tracing::warn!("skipping {key}: {err}");
            }
        }
    }
    Ok(payloads)
}

/// JSON rendering of `payloads` for the verbose dump.
pub fn payloads_to_json(payloads: &ProjectPayloads) -> Value {
    let map: Map<String, Value> = payloads
        .iter()
        .map(|(project, records)| {
            let templates: Vec<Value> = records.iter().map(TemplateRecord::to_value).collect();
            (project.to_string(), json!({ "templates": templates }))
        })
        .collect();
    Value::Object(map)
}

/// Create every project in `payloads` that the controller does not have.
pub fn create_missing_projects<C: Controller + ?Sized>(
    controller: &C,
    payloads: &ProjectPayloads,
    policy: &RetryPolicy,
    stats: &mut RestoreStats,
) -> Result<(), SyncError> {
    let existing: BTreeSet<ProjectName> = controller
        .list_projects()?
        .into_iter()
        .map(|p| p.name)
        .collect();

    for project in payloads.keys() {
        if existing.contains(project) {
            tracing::info!("project {project} already exists, skipping creation");
            continue;
        }
        let result = controller
            .create_project(project)
            .map_err(SyncError::from)
            .and_then(|task_id| {
                tracing::info!("creation of project {project} requested, task {task_id}");
                await_task(controller, &task_id, policy)
            });
        match result {
            Ok(true) => stats.projects_created += 1,
            Ok(false) => {
                stats.projects_failed += 1;
                tracing::warn!("project {project} was not created in time");
            }
            Err(err) => {
                stats.projects_failed += 1;
                tracing::warn!("failed to create project {project}: {err}");
            }
        }
    }
    Ok(())
}

/// Import each project's group of templates as one task.
///
/// Accounting is per group: a completed import adds one to
/// `templates_imported`, a timeout or error adds one to `templates_failed`.
pub fn import_payloads<C: Controller + ?Sized>(
    controller: &C,
    payloads: &ProjectPayloads,
    policy: &RetryPolicy,
    stats: &mut RestoreStats,
) {
    for (project, records) in payloads {
        let result = controller
            .import_templates(project, records)
            .map_err(SyncError::from)
            .and_then(|task_id| {
                tracing::info!(
                    "import of {} template(s) into {project} requested, task {task_id}",
                    records.len()
                );
                await_task(controller, &task_id, policy)
            });
        match result {
            Ok(true) => stats.templates_imported += 1,
            Ok(false) => {
                stats.templates_failed += 1;
                tracing::warn!("import into {project} did not finish in time");
            }
            Err(err) => {
                stats.templates_failed += 1;
                tracing::warn!("failed to import templates for project {project}: {err}");
            }
        }
    }
}

/// `Ok(true)` once the task completed, `Ok(false)` on timeout.
fn await_task<C: Controller + ?Sized>(
    controller: &C,
    task_id: &TaskId,
    policy: &RetryPolicy,
) -> Result<bool, SyncError> {
    Ok(match poll_task(controller, task_id, policy)? {
        PollOutcome::Completed(_) => true,
        PollOutcome::TimedOut { attempts } => {
            tracing::warn!("task {task_id} still running after {attempts} poll(s)");
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use templar_controller::memory::MemoryController;
    use tempfile::TempDir;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::ZERO, 3)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn doc(project: &str, name: &str) -> String {
        json!([{"projectName": project, "name": name, "templateContent": "hostname x"}])
            .to_string()
    }

    #[test]
    fn groups_files_by_project_directory() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Campus/a.json", &doc("Campus", "a"));
        write(repo.path(), "projects/Campus/b.json", &doc("Campus", "b"));
        write(repo.path(), "projects/Branch/c.json", &doc("Branch", "c"));

        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();

        assert_eq!(stats.repository_projects, 2);
        assert_eq!(stats.repository_templates, 3);
        assert_eq!(payloads[&ProjectName::from("Campus")].len(), 2);
        assert_eq!(payloads[&ProjectName::from("Branch")].len(), 1);
    }

    #[test]
    fn malformed_files_are_counted_and_skipped() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Campus/a.json", &doc("Campus", "a"));
        write(repo.path(), "projects/Campus/broken.json", "[{");
        write(repo.path(), "projects/Campus/empty.json", "[]");

        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();
        assert_eq!(stats.repository_templates, 3);
        assert_eq!(stats.unreadable_files, 2);
        assert_eq!(payloads[&ProjectName::from("Campus")].len(), 1);
    }

    #[test]
    fn existing_projects_are_not_recreated() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Campus/a.json", &doc("Campus", "a"));
        write(repo.path(), "projects/Branch/c.json", &doc("Branch", "c"));
        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();

        let controller = MemoryController::new().with_project("Campus");
        create_missing_projects(&controller, &payloads, &policy(), &mut stats).unwrap();

        assert_eq!(controller.created_projects(), vec![ProjectName::from("Branch")]);
        assert_eq!(stats.projects_created, 1);
        assert_eq!(stats.projects_failed, 0);
    }

    #[test]
    fn rejected_creation_is_counted_and_run_continues() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Bad/a.json", &doc("Bad", "a"));
        write(repo.path(), "projects/Good/b.json", &doc("Good", "b"));
        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();

        let controller = MemoryController::new().with_rejected_project("Bad");
        create_missing_projects(&controller, &payloads, &policy(), &mut stats).unwrap();

        assert_eq!(stats.projects_failed, 1);
        assert_eq!(stats.projects_created, 1);
    }

    #[test]
    fn import_counts_one_per_group() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Campus/a.json", &doc("Campus", "a"));
        write(repo.path(), "projects/Campus/b.json", &doc("Campus", "b"));
        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();

        let controller = MemoryController::new().with_project("Campus");
        import_payloads(&controller, &payloads, &policy(), &mut stats);

        assert_eq!(stats.templates_imported, 1);
        assert_eq!(stats.templates_failed, 0);
        assert_eq!(controller.imports(), vec![(ProjectName::from("Campus"), 2)]);
        assert_eq!(controller.templates_in(&ProjectName::from("Campus")).len(), 2);
    }

    #[test]
    fn payload_dump_nests_templates_under_project() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "projects/Campus/a.json", &doc("Campus", "a"));
        let mut stats = RestoreStats::default();
        let payloads = build_project_payloads(repo.path(), &mut stats).unwrap();

        let dumped = payloads_to_json(&payloads);
        assert_eq!(dumped["Campus"]["templates"][0]["name"], "a");
    }
}
