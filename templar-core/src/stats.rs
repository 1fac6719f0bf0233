//! Run counters, accumulated by one pipeline pass and reported at the end.

use serde::Serialize;

/// Tally for an export → reconcile → commit run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub controller_projects: usize,
    pub controller_templates: usize,
    pub templates_compared: usize,
    pub changed_templates: usize,
    pub new_templates: usize,
    /// Exported records skipped because their names are unusable as paths.
    pub rejected_templates: usize,
    pub files_updated: usize,
    pub file_copy_errors: usize,
    pub files_deleted: usize,
}

impl ExportStats {
    /// `true` when at least one template needs to be written to the mirror.
    pub fn has_template_changes(&self) -> bool {
        self.changed_templates > 0 || self.new_templates > 0
    }

    /// Label/value pairs in reporting order.
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("controller_projects", self.controller_projects),
            ("controller_templates", self.controller_templates),
            ("templates_compared", self.templates_compared),
            ("changed_templates", self.changed_templates),
            ("new_templates", self.new_templates),
            ("rejected_templates", self.rejected_templates),
            ("files_updated", self.files_updated),
            ("file_copy_errors", self.file_copy_errors),
            ("files_deleted", self.files_deleted),
        ]
    }
}

/// Tally for a restore run.
///
/// `templates_imported` / `templates_failed` count import *groups* (one per
/// project), not individual templates: the controller reports one task per
/// group and its outcome is attributed to the group as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreStats {
    pub repository_projects: usize,
    pub repository_templates: usize,
    pub unreadable_files: usize,
    pub projects_created: usize,
    pub projects_failed: usize,
    pub templates_imported: usize,
    pub templates_failed: usize,
}

impl RestoreStats {
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("repository_projects", self.repository_projects),
            ("repository_templates", self.repository_templates),
            ("unreadable_files", self.unreadable_files),
            ("projects_created", self.projects_created),
            ("projects_failed", self.projects_failed),
            ("templates_imported", self.templates_imported),
            ("templates_failed", self.templates_failed),
        ]
    }

    pub fn has_failures(&self) -> bool {
        self.projects_failed > 0 || self.templates_failed > 0 || self.unreadable_files > 0
    }
}
