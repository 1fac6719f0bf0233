//! Version-control client for the template mirror.
//!
//! [`GitRepository`] shells out to the `git` binary. Clone URLs carry
//! credentials, so every message built from git output goes through
//! [`redact_url_credentials`] first.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use templar_core::config::GitAuthor;
use url::Url;

use crate::error::SyncError;

/// The operations the synchronizer needs from a working copy.
pub trait VersionControl {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Remove `rel` from the index and the working tree.
    fn remove(&mut self, rel: &Path) -> Result<(), SyncError>;

    /// Stage every change (including deletions) under `pathspec`.
    fn stage(&mut self, pathspec: &str) -> Result<(), SyncError>;

    /// Commit the index. Returns `false` when there was nothing to commit.
    fn commit(&mut self, message: &str) -> Result<bool, SyncError>;

    /// Push the current branch to `origin`.
    fn push(&mut self) -> Result<(), SyncError>;
}

/// Formats a git error with both stdout and stderr.
fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    let detail = match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{stderr}\n{stdout}"),
    };
    redact_url_credentials(&detail)
}

/// Replace the userinfo of every URL in `text` that carries credentials.
///
/// Words are split on whitespace and quotes, so git's `'https://...'`
/// quoting is handled. A word that looks like a URL with userinfo but does
/// not parse is masked whole.
pub fn redact_url_credentials(text: &str) -> String {
    let is_boundary = |c: char| c.is_whitespace() || c == '\'' || c == '"';
    let mut out = String::with_capacity(text.len());
    for piece in text.split_inclusive(is_boundary) {
        let (word, boundary) = match piece.char_indices().last() {
            Some((idx, c)) if is_boundary(c) => piece.split_at(idx),
            _ => (piece, ""),
        };
        out.push_str(&redact_word(word));
        out.push_str(boundary);
    }
    out
}

fn redact_word(word: &str) -> Cow<'_, str> {
    let Some((_, after_scheme)) = word.split_once("://") else {
        return Cow::Borrowed(word);
    };
    match Url::parse(word) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            if url.set_password(None).is_ok() && url.set_username("***").is_ok() {
                Cow::Owned(url.to_string())
            } else {
                Cow::Borrowed("***")
            }
        }
        Ok(_) => Cow::Borrowed(word),
        Err(_) => {
            let authority = after_scheme.split('/').next().unwrap_or_default();
            if authority.contains('@') {
                Cow::Borrowed("***")
            } else {
                Cow::Borrowed(word)
            }
        }
    }
}

fn git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn git_failure(command: &str, detail: impl Into<String>) -> SyncError {
    SyncError::Git {
        command: command.to_string(),
        detail: detail.into(),
    }
}

/// A cloned working copy driven through the `git` binary.
#[derive(Debug)]
pub struct GitRepository {
    workdir: PathBuf,
    author: GitAuthor,
}

impl GitRepository {
    /// Clone `url` into `dest`. `dest` must not exist yet.
    pub fn clone_into(url: &str, dest: &Path, author: GitAuthor) -> Result<Self, SyncError> {
        tracing::info!("cloning {} into {}", redact_url_credentials(url), dest.display());
        let output = git_command()
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(dest)
            .output()
            .map_err(|e| git_failure("clone", e.to_string()))?;
        if !output.status.success() {
            return Err(git_failure("clone", format_git_error(&output)));
        }
        Ok(Self::open(dest, author))
    }

    /// Wrap an existing working copy.
    pub fn open(workdir: impl Into<PathBuf>, author: GitAuthor) -> Self {
        Self {
            workdir: workdir.into(),
            author,
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<Output, SyncError> {
        let command = args.first().copied().unwrap_or("git");
        tracing::trace!("git {}", args.join(" "));
        git_command()
            .current_dir(&self.workdir)
            .args(args)
            .output()
            .map_err(|e| git_failure(command, e.to_string()))
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output, SyncError> {
        let output = self.run_git(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            let command = args.first().copied().unwrap_or("git");
            Err(git_failure(command, format_git_error(&output)))
        }
    }
}

impl VersionControl for GitRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn remove(&mut self, rel: &Path) -> Result<(), SyncError> {
        let rel_str = rel.to_string_lossy().into_owned();
        self.run_checked(&["rm", "--quiet", "--ignore-unmatch", "--", &rel_str])?;
        // Untracked files are left behind by `git rm`.
        let abs = self.workdir.join(rel);
        if abs.exists() {
            std::fs::remove_file(&abs).map_err(|e| crate::error::io_err(&abs, e))?;
        }
        tracing::info!("deleted {}", rel.display());
        Ok(())
    }

    fn stage(&mut self, pathspec: &str) -> Result<(), SyncError> {
        // A pathspec that matches nothing is an error for `git add`.
        if !self.workdir.join(pathspec).exists() {
            tracing::debug!("nothing to stage under {pathspec}");
            return Ok(());
        }
        self.run_checked(&["add", "--all", "--", pathspec])?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<bool, SyncError> {
        let staged = self.run_git(&["diff", "--cached", "--quiet"])?;
        match staged.status.code() {
            Some(0) => {
                tracing::info!("nothing to commit");
                return Ok(false);
            }
            Some(1) => {}
            _ => return Err(git_failure("diff", format_git_error(&staged))),
        }

        let name = format!("user.name={}", self.author.name);
        let email = format!("user.email={}", self.author.email);
        self.run_checked(&["-c", &name, "-c", &email, "commit", "--quiet", "-m", message])?;
        tracing::info!("committed: {message}");
        Ok(true)
    }

    fn push(&mut self) -> Result<(), SyncError> {
        self.run_checked(&["push", "--quiet", "origin", "HEAD"])?;
        tracing::info!("pushed to origin");
        Ok(())
    }
}
