//! Atomic writer for template documents.
//!
//! ## `atomic_write` protocol
//!
//! 1. Render content (already done by caller).
//! 2. Ensure the parent directory exists.
//! 3. Write to `<path>.templar.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//!
//! Staged documents are pretty JSON with a 4-space indent, one
//! single-element array per file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use templar_core::{ExportStats, TemplateKey, TemplateRecord};

use crate::error::{io_err, json_err, SyncError};

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Pretty-print `value` with a 4-space indent and a trailing newline.
pub fn render_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    // serde_json only emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically replace `path` with `content`.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}.templar.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

/// Render `value` and write it atomically to `path`.
pub fn write_json(path: &Path, value: &Value) -> Result<(), SyncError> {
    let content = render_json(value).map_err(|e| json_err(path, e))?;
    atomic_write(path, &content)
}

// ---------------------------------------------------------------------------
// Staging and copy
// ---------------------------------------------------------------------------

/// Write each record's document under `staging_root` at its relative path.
///
/// Returns the keys in the order they were staged.
pub fn stage_records(
    staging_root: &Path,
    records: &[TemplateRecord],
) -> Result<Vec<TemplateKey>, SyncError> {
    let mut keys = Vec::with_capacity(records.len());
    for record in records {
        let key = record.key();
        write_json(&staging_root.join(key.relative_path()), &record.to_document())?;
        tracing::debug!("staged {key}");
        keys.push(key);
    }
    Ok(keys)
}

/// Copy staged files into the repository working tree.
///
/// Best effort: a failed copy is logged and counted in
/// `file_copy_errors`, the rest still proceed.
pub fn copy_into_repo(
    staging_root: &Path,
    repo_root: &Path,
    keys: &[TemplateKey],
    stats: &mut ExportStats,
) {
    for key in keys {
        let rel = key.relative_path();
        match copy_one(&staging_root.join(&rel), &repo_root.join(&rel)) {
            Ok(()) => {
                stats.files_updated += 1;
                tracing::info!("updated {key}");
            }
            Err(err) => {
                stats.file_copy_errors += 1;
                tracing::warn!("could not copy {key} into the repository: {err}");
            }
        }
    }
}

fn copy_one(from: &Path, to: &Path) -> Result<(), SyncError> {
    let content = std::fs::read_to_string(from).map_err(|e| io_err(from, e))?;
    atomic_write(to, &content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
