//! Error types for Tabulon operations.
//!
//! This module provides the main error type [`TabulonError`] which wraps
//! the error conditions that can occur while editing or exchanging a
//! diagram document.

use std::io;

use thiserror::Error;

/// The main error type for Tabulon operations.
///
/// Mutations that target a missing entity generally no-op instead of
/// erroring; the variants here cover creation-dependent operations (the
/// caller needs to react, e.g. abort a bulk import) and document
/// interchange failures.
#[derive(Debug, Error)]
pub enum TabulonError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Field not found: {field_id} in table {table_id}")]
    FieldNotFound { table_id: String, field_id: String },

    #[error("Relationship field mapping must pair at least one source field with one target field")]
    EmptyFieldMapping,
}
