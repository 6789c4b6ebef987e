//! JSON persistence for diagram documents.
//!
//! The wire format is the diagram model serialized as camelCase JSON.
//! Loading accepts both current documents and legacy ones that carry
//! singular `sourceFieldId`/`targetFieldId` relationship endpoints or a
//! `label` instead of `name`; [`Diagram::normalize`] runs on every load so
//! a parsed document already satisfies the referential invariant.

use std::fs;
use std::path::Path;

use log::info;

use tabulon_core::model::Diagram;

use crate::error::TabulonError;

/// Parses a diagram from a JSON string, normalizing legacy shapes.
///
/// # Errors
///
/// Returns [`TabulonError::Document`] when the input is not valid JSON for
/// the document schema.
pub fn from_json_str(input: &str) -> Result<Diagram, TabulonError> {
    let mut diagram: Diagram = serde_json::from_str(input)?;
    diagram.normalize();
    info!(
        tables = diagram.tables.len(),
        relationships = diagram.relationships.len(),
        notes = diagram.notes.len();
        "Parsed document"
    );
    Ok(diagram)
}

/// Serializes a diagram to a compact JSON string.
///
/// # Errors
///
/// Returns [`TabulonError::Document`] when serialization fails.
pub fn to_json_string(diagram: &Diagram) -> Result<String, TabulonError> {
    Ok(serde_json::to_string(diagram)?)
}

/// Serializes a diagram to pretty-printed JSON, the on-disk save format.
///
/// # Errors
///
/// Returns [`TabulonError::Document`] when serialization fails.
pub fn to_json_string_pretty(diagram: &Diagram) -> Result<String, TabulonError> {
    Ok(serde_json::to_string_pretty(diagram)?)
}

/// Reads and parses a diagram from a JSON file.
///
/// # Errors
///
/// Returns [`TabulonError::Io`] when the file cannot be read and
/// [`TabulonError::Document`] when its contents do not parse.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Diagram, TabulonError> {
    let contents = fs::read_to_string(path)?;
    from_json_str(&contents)
}

/// Writes a diagram to a file as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`TabulonError::Io`] when the file cannot be written.
pub fn to_json_file(path: impl AsRef<Path>, diagram: &Diagram) -> Result<(), TabulonError> {
    fs::write(path, to_json_string_pretty(diagram)?)?;
    Ok(())
}
