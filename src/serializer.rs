//! Serialization of OpenAPI documents to JSON or YAML, and the cache file they are persisted in.

use crate::error::Result;
use crate::openapi_builder::OpenApiDocument;
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns [`Error::SerializationError`](crate::error::Error::SerializationError) if
/// serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// This is the format of the cache file served by the documentation endpoints.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
/// Parent directories are not created.
///
/// # Errors
///
/// Returns [`Error::IoError`](crate::error::Error::IoError) if the file cannot be written.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());
    fs::write(path, content)?;
    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Reads a persisted document back, byte for byte.
pub fn read_document(path: &Path) -> Result<String> {
    debug!("Reading document from {}", path.display());
    Ok(fs::read_to_string(path)?)
}
