//! End-to-end export against a real (local, bare) git remote.
//!
//! Skipped when no `git` binary is on the PATH.

mod common;

use std::path::Path;
use std::process::Command;

use templar_controller::memory::MemoryController;
use templar_core::config::GitAuthor;
use templar_core::TemplateKey;
use templar_sync::{
    run_export, scan_templates, GitRepository, SyncOutcome, VersionControl, WorkLayout,
};
use tempfile::TempDir;

use common::{fast_policy, options, record, store};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(["-c", "user.name=seed", "-c", "user.email=seed@localhost"])
        .args(args)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn author() -> GitAuthor {
    GitAuthor {
        name: "templar-test".to_string(),
        email: "templar-test@localhost".to_string(),
    }
}

/// Bare remote seeded with one stale template.
fn seeded_remote(root: &Path) -> String {
    let remote = root.join("remote.git");
    git(root, &["init", "--quiet", "--bare", remote.to_str().expect("utf-8 path")]);

    let seed = root.join("seed");
    git(root, &["clone", "--quiet", remote.to_str().expect("utf-8 path"), "seed"]);
    store(&seed, &record("Legacy", "old", "hostname old"));
    std::fs::write(seed.join("README.md"), "template mirror\n").expect("readme");
    git(&seed, &["add", "--all"]);
    git(&seed, &["commit", "--quiet", "-m", "seed"]);
    git(&seed, &["push", "--quiet", "origin", "HEAD"]);

    remote.to_string_lossy().into_owned()
}

#[test]
fn export_commits_and_pushes_to_remote() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tmp");
    let remote = seeded_remote(tmp.path());
    let layout = WorkLayout::new(tmp.path().join("work"));

    let clone_dir = layout.reset_clone_dir().expect("clone dir");
    let mut repo = GitRepository::clone_into(&remote, &clone_dir, author()).expect("clone");
    let controller = MemoryController::new()
        .with_template(record("Campus", "access", "vlan 10"));

    let report = run_export(&controller, &mut repo, &layout, &fast_policy(), &options(false))
        .expect("export");
    assert!(matches!(report.outcome, SyncOutcome::Pushed { .. }));
    assert_eq!(report.stats.files_deleted, 1);

    let verify = tmp.path().join("verify");
    git(tmp.path(), &["clone", "--quiet", &remote, "verify"]);
    let keys: Vec<TemplateKey> = scan_templates(&verify).expect("scan").into_iter().collect();
    assert_eq!(keys, vec![TemplateKey::new("Campus", "access")]);
    assert!(verify.join("README.md").exists(), "non-template files are untouched");

    let subject = git(&verify, &["log", "-1", "--format=%s"]);
    assert!(subject.starts_with("Templates updated by integration - "), "{subject}");
    let author_line = git(&verify, &["log", "-1", "--format=%an <%ae>"]);
    assert_eq!(author_line, "templar-test <templar-test@localhost>");
}

#[test]
fn unchanged_mirror_creates_no_commit() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tmp");
    let remote = seeded_remote(tmp.path());
    let layout = WorkLayout::new(tmp.path().join("work"));
    let controller = MemoryController::new()
        .with_template(record("Legacy", "old", "hostname old"));

    let clone_dir = layout.reset_clone_dir().expect("clone dir");
    let mut repo = GitRepository::clone_into(&remote, &clone_dir, author()).expect("clone");
    let before = git(repo.workdir(), &["rev-parse", "HEAD"]);

    let report = run_export(&controller, &mut repo, &layout, &fast_policy(), &options(false))
        .expect("export");
    assert_eq!(report.outcome, SyncOutcome::NoChanges);
    assert_eq!(git(repo.workdir(), &["rev-parse", "HEAD"]), before);
}

#[test]
fn commit_with_clean_index_reports_nothing_to_commit() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tmp");
    let remote = seeded_remote(tmp.path());
    let clone_dir = tmp.path().join("clone");
    let mut repo = GitRepository::clone_into(&remote, &clone_dir, author()).expect("clone");

    repo.stage("projects").expect("stage");
    assert!(!repo.commit("empty").expect("commit"));
}

#[test]
fn clone_failure_is_reported_as_git_error() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tmp");
    let missing = tmp.path().join("no-such-remote.git");
    let err = GitRepository::clone_into(
        missing.to_str().expect("utf-8 path"),
        &tmp.path().join("clone"),
        author(),
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("git clone failed"), "{err}");
}
