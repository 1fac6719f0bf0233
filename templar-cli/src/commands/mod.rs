pub mod export;
pub mod restore;
mod summary;

use std::path::Path;

use anyhow::{Context, Result};

use templar_controller::Controller;
use templar_core::Settings;
use templar_sync::{GitRepository, WorkLayout};

/// Everything a command needs once configuration has been validated.
pub(crate) struct Session {
    pub settings: Settings,
    pub controller: Box<dyn Controller>,
    pub layout: WorkLayout,
    pub repo: GitRepository,
}

/// Resolve settings; nothing touches the network before this succeeds.
pub(crate) fn load_settings(config: Option<&Path>) -> Result<Settings> {
    Settings::load(config).context("invalid configuration")
}

/// Log in to the controller and take a fresh clone.
pub(crate) fn open_session(settings: Settings) -> Result<Session> {
    tracing::debug!(
        "controller {} ({:?}), work dir {}",
        settings.base_url(),
        settings.flavor,
        settings.work_dir.display()
    );

    let controller = templar_controller::connect(&settings)
        .with_context(|| format!("could not log in to {}", settings.base_url()))?;

    let layout = WorkLayout::new(&settings.work_dir);
    let clone_dir = layout
        .reset_clone_dir()
        .context("failed to prepare the clone directory")?;
    let clone_url = settings
        .authenticated_repo_url()
        .context("invalid configuration")?;
    let repo = GitRepository::clone_into(
        clone_url.as_str(),
        &clone_dir,
        settings.git_author.clone(),
    )
    .with_context(|| format!("failed to clone {}", settings.browse_url()))?;

    Ok(Session {
        settings,
        controller,
        layout,
        repo,
    })
}
