//! Domain types shared by the exporter, reconciler and restorer.
//!
//! Template payloads are kept as opaque `serde_json` objects; only the two
//! identity fields (`projectName`, `name`) are interpreted.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// Top-level directory that holds one sub-directory per controller project.
pub const PROJECTS_DIR: &str = "projects";

/// Extension of every template file in the mirror.
pub const TEMPLATE_EXT: &str = "json";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a controller project; doubles as a directory name in the mirror.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Controller-assigned template identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Handle of an asynchronous controller job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Template identity
// ---------------------------------------------------------------------------

/// Identity of a template: `(projectName, name)`.
///
/// Rendered as the mirror-relative path `projects/<project>/<name>.json`.
/// Ordering is by project, then name, which keeps key sets and logs stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateKey {
    pub project: ProjectName,
    pub name: String,
}

impl TemplateKey {
    pub fn new(project: impl Into<ProjectName>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }

    /// `projects/<project>/<name>.json`
    pub fn relative_path(&self) -> PathBuf {
        Path::new(PROJECTS_DIR)
            .join(&self.project.0)
            .join(format!("{}.{TEMPLATE_EXT}", self.name))
    }

    /// Parse a mirror-relative path back into a key.
    ///
    /// Accepts exactly `projects/<project>/<name>.json`; anything deeper,
    /// shallower or with another extension yields `None`.
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let parts: Vec<&str> = path
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        let [root, project, file] = parts.as_slice() else {
            return None;
        };
        if *root != PROJECTS_DIR {
            return None;
        }
        let name = file.strip_suffix(&format!(".{TEMPLATE_EXT}"))?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(*project, name))
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PROJECTS_DIR}/{}/{}.{TEMPLATE_EXT}",
            self.project, self.name
        )
    }
}

// ---------------------------------------------------------------------------
// Template record
// ---------------------------------------------------------------------------

/// One exported template, kept verbatim.
///
/// The full JSON object is preserved (including fields this crate knows
/// nothing about) so that it round-trips byte-for-byte through the mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct TemplateRecord {
    project: ProjectName,
    name: String,
    body: Map<String, Value>,
}

impl TemplateRecord {
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> TemplateKey {
        TemplateKey::new(self.project.clone(), self.name.clone())
    }

    /// The raw JSON object as exported by the controller.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }

    /// On-disk form: a single-element array wrapping the record, which is
    /// what the controller's import endpoint accepts.
    pub fn to_document(&self) -> Value {
        Value::Array(vec![self.to_value()])
    }

    /// Extract the record from an on-disk document (first array element).
    pub fn from_document(doc: Value) -> Result<Self, RecordError> {
        match doc {
            Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or(RecordError::EmptyDocument)
                .and_then(Self::try_from),
            Value::Object(_) => Err(RecordError::NotAnArray),
            _ => Err(RecordError::NotAnObject),
        }
    }
}

impl TryFrom<Value> for TemplateRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(body) = value else {
            return Err(RecordError::NotAnObject);
        };
        let project = string_field(&body, "projectName")?;
        let name = string_field(&body, "name")?;
        Ok(Self {
            project: ProjectName(project),
            name,
            body,
        })
    }
}

impl From<TemplateRecord> for Value {
    fn from(record: TemplateRecord) -> Self {
        Value::Object(record.body)
    }
}

fn string_field(body: &Map<String, Value>, field: &'static str) -> Result<String, RecordError> {
    let value = match body.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(RecordError::MissingField { field }),
    };
    if !is_path_segment(value) {
        return Err(RecordError::InvalidName {
            field,
            value: value.clone(),
        });
    }
    Ok(value.clone())
}

/// `name` maps onto exactly one normal path component on every platform.
fn is_path_segment(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

// ---------------------------------------------------------------------------
// Controller listings and tasks
// ---------------------------------------------------------------------------

/// Template entry nested inside a project listing. Every field is optional:
/// the controller omits `id` on some records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One project as returned by the controller's project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: ProjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub templates: Vec<TemplateSummary>,
}

/// Polled state of an asynchronous controller job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    /// Populated once the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Value>,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Job result, itself a serialized JSON document (export jobs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TaskStatus {
    pub fn is_complete(&self) -> bool {
        match &self.end_time {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
