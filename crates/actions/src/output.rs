//! Output naming.

use excelrelay_core::{opt_string_or_number, string_or_number};
use serde::Deserialize;

/// Output options shared by every operation that produces a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    /// `None` means the operation default; an empty string means "derive
    /// from the input file name".
    #[serde(deserialize_with = "opt_string_or_number")]
    pub output_file_name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub binary_data_name: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            output_file_name: None,
            binary_data_name: "data".to_string(),
        }
    }
}

impl OutputOptions {
    /// Attachment key for the primary output.
    pub fn key(&self) -> &str {
        let key = self.binary_data_name.trim();
        if key.is_empty() {
            "data"
        } else {
            key
        }
    }

    /// Attachment key for a secondary output, e.g. `data_json`.
    pub fn suffixed_key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.key())
    }

    /// Final file name with `extension` enforced.
    pub fn file_name(&self, default_name: &str, original: &str, stem: &str, extension: &str) -> String {
        let requested = self.output_file_name.as_deref().unwrap_or(default_name).trim();
        let name = if requested.is_empty() {
            derive_name(original, stem, extension)
        } else {
            requested.to_string()
        };
        enforce_extension(&name, extension)
    }
}

/// `name` without its last extension.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if !name[dot..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// Name from the input file, or `stem` when there is none.
pub fn derive_name(original: &str, stem: &str, extension: &str) -> String {
    let base = strip_extension(original.trim());
    let base = if base.is_empty() { stem } else { base };
    format!("{base}{extension}")
}

/// Replace the extension of `name` unless it already ends in `extension`.
pub fn enforce_extension(name: &str, extension: &str) -> String {
    if name.to_ascii_lowercase().ends_with(&extension.to_ascii_lowercase()) {
        name.to_string()
    } else {
        format!("{}{extension}", strip_extension(name))
    }
}

/// Drop any of the `known` extensions from `name`, then append `extension`.
pub fn replace_known_extension(name: &str, known: &[&str], extension: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let base = known
        .iter()
        .find(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
        .map_or(name, |ext| &name[..name.len() - ext.len()]);
    format!("{base}{extension}")
}

/// Comma-separated list into trimmed, non-empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-separated integers, skipping entries that do not parse.
pub fn split_indexes(value: &str) -> Vec<i64> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}
