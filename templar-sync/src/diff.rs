//! Readable diffs of template documents for verbose output.

use serde_json::Value;
use similar::TextDiff;

use templar_core::json_eq::canonicalize;
use templar_core::TemplateKey;

/// Unified diff between the stored and exported document of `key`.
///
/// Both sides are canonicalized first, so reordered arrays and keys do not
/// show up as noise.
pub fn unified_json_diff(key: &TemplateKey, stored: &Value, exported: &Value) -> String {
    let old = pretty(&canonicalize(stored));
    let new = pretty(&canonicalize(exported));
    let old_header = format!("a/{key}");
    let new_header = format!("b/{key}");
    TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn pretty(value: &Value) -> String {
    let mut out = serde_json::to_string_pretty(value).unwrap_or_default();
    out.push('\n');
    out
}
