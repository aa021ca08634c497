//! Error types for the offersheet conversion pipeline and API server.
//!
//! - [`InputError`] - the spreadsheet could not be opened, parsed or selected
//! - [`SchemaError`] - required columns are absent, or a schema file is invalid
//! - [`TransformError`] - the output document could not be rendered or written
//! - [`PipelineError`] - top-level wrapper returned by [`crate::convert`]
//! - [`ServerError`] - offers API startup and token errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while reading the input spreadsheet.
#[derive(Debug, Error)]
pub enum InputError {
    /// File missing or unreadable.
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but is not a readable spreadsheet.
    #[error("Cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The sheet selector matched no worksheet.
    #[error("Sheet {selector} not found (available: {})", .available.join(", "))]
    SheetNotFound {
        selector: String,
        available: Vec<String>,
    },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors about the column schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more mapped columns are absent from the sheet.
    #[error("Columns not found in the spreadsheet:\n- {}", .0.join("\n- "))]
    MissingColumns(Vec<String>),

    /// The same canonical field appears twice in a schema.
    #[error("Duplicate field in schema: {0}")]
    DuplicateField(String),

    /// Schema file is not a JSON object of strings.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

impl SchemaError {
    /// Missing column labels, in schema order. Empty for other variants.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            SchemaError::MissingColumns(cols) => cols,
            _ => &[],
        }
    }
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors while rendering or writing the output document.
#[derive(Debug, Error)]
pub enum TransformError {
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output file could not be written.
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::convert`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Output error.
    #[error("Output error: {0}")]
    Transform(#[from] TransformError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// Offers API errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A required setting was not provided.
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Listener could not be bound.
    #[error("Cannot bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Token could not be signed or verified.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
