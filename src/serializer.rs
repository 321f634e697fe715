//! Serialization module for converting OpenAPI documents to JSON or YAML and
//! persisting them.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// The output is indented for readability, making it suitable for human
/// review and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Serializes the document in the requested format.
pub fn serialize(doc: &OpenApiDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serialize_json(doc),
        OutputFormat::Yaml => serialize_yaml(doc),
    }
}

/// Writes string content to a file, replacing it atomically.
///
/// The content goes to a temporary file next to `path` which is then renamed
/// over it, so a failed write never leaves a partial file behind. An existing
/// file keeps its permissions; a new one is created readable by everyone
/// (`0644` on Unix). Parent directories are not created.
///
/// # Errors
///
/// Returns an error if the parent directory does not exist or the file cannot
/// be written or renamed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create file in directory: {}", parent.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;
    if let Some(permissions) = target_permissions(path)? {
        file.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("Failed to set permissions on: {}", path.display()))?;
    }
    file.persist(path)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Permissions the written file should end up with, if they differ from
/// what the temporary file was created with.
fn target_permissions(path: &Path) -> Result<Option<fs::Permissions>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(default_permissions()),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect file: {}", path.display())),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    // temporary files are created owner-only
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
