//! templar core library: domain types, structural JSON equality, settings,
//! run counters and errors.
//!
//! - [`types`]: newtypes, template identity, controller listings and tasks
//! - [`json_eq`]: order-insensitive structural equality
//! - [`config`]: [`Settings`] resolution from environment + YAML
//! - [`stats`]: [`ExportStats`] / [`RestoreStats`]
//! - [`error`]: [`RecordError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod json_eq;
pub mod stats;
pub mod types;

pub use config::{ApiFlavor, PollSettings, Settings};
pub use error::{ConfigError, RecordError};
pub use stats::{ExportStats, RestoreStats};
pub use types::{
    ProjectName, ProjectSummary, TaskId, TaskStatus, TemplateId, TemplateKey, TemplateRecord,
    TemplateSummary,
};
