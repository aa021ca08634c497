//! # Offersheet - spreadsheet to JSON conversion for offer catalogs
//!
//! Offersheet reads one sheet of a workbook (or a CSV export), checks that
//! every mapped column is present, and writes one JSON object per row with
//! fixed output keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ XLSX / CSV  │────▶│   Parser    │────▶│  Transform  │────▶│ output.json │
//! │   (sheet)   │     │  (Table)    │     │ (schema map)│     │  (array)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                             ┌─────────────┐
//!                                                             │ Offers API  │
//!                                                             │ (JWT, axum) │
//!                                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use offersheet::{convert, ConvertOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = convert(&ConvertOptions::new("ofertas.xlsx"))?;
//!     println!("Wrote {} records", report.record_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`schema`] - Output field to column mapping
//! - [`parser`] - Workbook and CSV loading
//! - [`transform`] - Normalization and the conversion pipeline
//! - [`api`] - Offers HTTP API and logging

// Core modules
pub mod error;
pub mod schema;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{InputError, PipelineError, SchemaError, ServerError, TransformError};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{FieldMapping, SchemaMap, OFFER_COLUMNS};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{load, Cell, SheetSelector, Table};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    build_document,
    convert,
    normalize,
    render_document,
    transform,
    validate,
    write_document,
    ConvertOptions,
    ConvertReport,
    Document,
    DEFAULT_OUTPUT,
};

// Server
pub mod server {
    pub use crate::api::server::{start_server, ServerConfig};
}
