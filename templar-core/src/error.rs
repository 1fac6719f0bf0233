//! Error types for templar-core.

use std::path::PathBuf;

use thiserror::Error;

/// A JSON value could not be interpreted as a template record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("template record is not a JSON object")]
    NotAnObject,

    #[error("template document must be a JSON array wrapping one record")]
    NotAnArray,

    #[error("template document is an empty array")]
    EmptyDocument,

    #[error("template record is missing string field `{field}`")]
    MissingField { field: &'static str },

    /// The name cannot be used as one directory or file name in the mirror.
    #[error("template record field `{field}` is not a usable file name: {value:?}")]
    InvalidName { field: &'static str, value: String },
}

/// All errors that can arise while assembling [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty.
    #[error("required environment variables are empty or unset: {}", .names.join(", "))]
    Missing { names: Vec<&'static str> },

    /// The settings file exists but could not be read.
    #[error("failed to read settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::FileSettings`].
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The repository URL is not an absolute URL with a host.
    #[error("repository URL `{url}` is not an absolute URL with a host")]
    InvalidRepoUrl { url: String },

    /// A poll policy with zero attempts would never observe the task.
    #[error("poll policy `{name}` must allow at least one attempt")]
    ZeroAttempts { name: &'static str },
}
