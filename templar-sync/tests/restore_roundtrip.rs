//! Restore runs: mirror → in-memory controller.

mod common;

use assert_fs::prelude::*;
use predicates::prelude::*;
use templar_controller::memory::MemoryController;
use templar_core::{ProjectName, RestoreStats};
use templar_sync::{run_export, run_restore, WorkLayout};

use common::{fast_policy, options, record, store, RecordingVcs};

#[test]
fn export_then_restore_recreates_every_project() {
    let source = MemoryController::new()
        .with_template(record("Campus", "access", "vlan 10"))
        .with_template(record("Campus", "uplink", "interface Gi1/0/48"))
        .with_template(record("Branch", "wan", "ip route 0.0.0.0 0.0.0.0 10.0.0.1"));
    let repo = assert_fs::TempDir::new().expect("repo");
    let work = assert_fs::TempDir::new().expect("work");
    let mut vcs = RecordingVcs::new(repo.path());
    run_export(
        &source,
        &mut vcs,
        &WorkLayout::new(work.path()),
        &fast_policy(),
        &options(false),
    )
    .expect("export");

    let target = MemoryController::new();
    let report = run_restore(&target, repo.path(), &fast_policy(), None).expect("restore");

    assert_eq!(report.stats.repository_projects, 2);
    assert_eq!(report.stats.repository_templates, 3);
    assert_eq!(report.stats.projects_created, 2);
    assert_eq!(report.stats.templates_imported, 2);
    assert_eq!(report.stats.templates_failed, 0);
    assert!(report.payload_dump.is_none());

    assert_eq!(
        target.imports(),
        vec![(ProjectName::from("Branch"), 1), (ProjectName::from("Campus"), 2)]
    );
    for project in ["Campus", "Branch"] {
        let project = ProjectName::from(project);
        let mut restored = target.templates_in(&project);
        let mut original = source.templates_in(&project);
        restored.sort_by(|a, b| a.name().cmp(b.name()));
        original.sort_by(|a, b| a.name().cmp(b.name()));
        assert_eq!(restored, original);
    }
}

#[test]
fn failed_import_is_counted_per_group() {
    let repo = assert_fs::TempDir::new().expect("repo");
    store(repo.path(), &record("Good", "a", "x"));
    store(repo.path(), &record("Bad", "b", "y"));
    store(repo.path(), &record("Bad", "c", "z"));

    let target = MemoryController::new()
        .with_project("Good")
        .with_project("Bad")
        .with_rejected_project("Bad");
    let report = run_restore(&target, repo.path(), &fast_policy(), None).expect("restore");

    assert_eq!(report.stats.projects_created, 0);
    assert_eq!(report.stats.templates_imported, 1);
    assert_eq!(report.stats.templates_failed, 1);
    assert!(report.stats.has_failures());
}

#[test]
fn import_that_never_finishes_counts_as_failed() {
    let repo = assert_fs::TempDir::new().expect("repo");
    store(repo.path(), &record("Campus", "a", "x"));

    let target = MemoryController::new()
        .with_project("Campus")
        .with_polls_until_complete(50);
    let report = run_restore(&target, repo.path(), &fast_policy(), None).expect("restore");

    assert_eq!(report.stats.templates_imported, 0);
    assert_eq!(report.stats.templates_failed, 1);
}

#[test]
fn verbose_restore_dumps_payloads() {
    let repo = assert_fs::TempDir::new().expect("repo");
    let work = assert_fs::TempDir::new().expect("work");
    store(repo.path(), &record("Campus", "a", "x"));

    let target = MemoryController::new();
    let report = run_restore(&target, repo.path(), &fast_policy(), Some(work.path()))
        .expect("restore");

    let dump = report.payload_dump.expect("dump path");
    assert!(dump.starts_with(work.path()));
    let name = dump.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("project_payload_") && name.ends_with(".json"), "{name}");
    work.child(name)
        .assert(predicate::str::contains("\"templates\""));
}

#[test]
fn empty_mirror_restores_nothing() {
    let repo = assert_fs::TempDir::new().expect("repo");
    let target = MemoryController::new();
    let report = run_restore(&target, repo.path(), &fast_policy(), None).expect("restore");

    assert_eq!(report.stats, RestoreStats::default());
    assert!(target.imports().is_empty());
    assert!(target.created_projects().is_empty());
}
