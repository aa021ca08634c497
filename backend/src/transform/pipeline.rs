//! High-level pipeline API for spreadsheet to JSON conversion.
//!
//! ```text
//! load table → validate columns → build one record per row → render → write
//! ```
//!
//! Column presence is checked once for the whole sheet and is fatal; a lookup
//! miss inside a single row only yields `null` for that field. Nothing is
//! written unless every earlier step succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use offersheet::{convert, ConvertOptions};
//!
//! let report = convert(&ConvertOptions::new("ofertas.xlsx"))?;
//! println!("OK: wrote {} with {} records.", report.output.display(), report.record_count);
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::normalize::normalize;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineResult, SchemaError, SchemaResult, TransformError};
use crate::parser::{load, SheetSelector, Table};
use crate::schema::SchemaMap;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "output.json";

/// Options for a conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Spreadsheet to read
    pub input: PathBuf,

    /// JSON file to write
    pub output: PathBuf,

    /// Worksheet to read
    pub sheet: SheetSelector,

    /// Field to column mapping
    pub schema: SchemaMap,
}

impl ConvertOptions {
    /// Options with the default output path, first sheet and built-in schema.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            sheet: SheetSelector::default(),
            schema: SchemaMap::offers(),
        }
    }
}

/// A transformed sheet, ready to be written
#[derive(Debug, Clone)]
pub struct Document {
    /// Sheet the records came from
    pub sheet_name: String,
    /// One record per sheet row
    pub records: Vec<Value>,
}

/// Summary of a successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub sheet_name: String,
    pub record_count: usize,
}

/// Check that every schema column exists in the table.
///
/// Fails with [`SchemaError::MissingColumns`] listing all absent labels, in
/// schema order.
pub fn validate(table: &Table, schema: &SchemaMap) -> SchemaResult<()> {
    let missing: Vec<String> = schema
        .columns()
        .into_iter()
        .filter(|column| !table.has_column(column))
        .map(String::from)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

/// Build one record per table row, keys in schema order.
pub fn transform(table: &Table, schema: &SchemaMap) -> Vec<Value> {
    let columns: Vec<(&str, Option<usize>)> = schema
        .iter()
        .map(|m| (m.field.as_str(), table.column_index(&m.column)))
        .collect();

    table
        .rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = columns
                .iter()
                .map(|(field, col)| {
                    let value = col
                        .and_then(|c| row.get(c))
                        .map(normalize)
                        .unwrap_or(Value::Null);
                    (field.to_string(), value)
                })
                .collect();
            Value::Object(record)
        })
        .collect()
}

/// Load, validate and transform one sheet.
pub fn build_document(input: &Path, sheet: &SheetSelector, schema: &SchemaMap) -> PipelineResult<Document> {
    log_info(format!("📖 Reading {}", input.display()));
    let table = load(input, sheet)?;
    log_success(format!(
        "Sheet '{}': {} rows, {} columns",
        table.sheet_name,
        table.row_count(),
        table.headers.len()
    ));

    log_info("📋 Checking columns...");
    if let Err(err) = validate(&table, schema) {
        for column in err.missing_columns() {
            log_warning(format!("Missing column: {}", column));
        }
        return Err(err.into());
    }
    log_success(format!("All {} mapped columns present", schema.len()));

    log_info("⚙️  Transforming rows...");
    let records = transform(&table, schema);
    log_success(format!("{} records", records.len()));

    Ok(Document {
        sheet_name: table.sheet_name,
        records,
    })
}

/// Render records as a pretty-printed JSON array (2-space indent, UTF-8 kept).
pub fn render_document(records: &[Value]) -> Result<String, TransformError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Render and write records to `path` in one write.
pub fn write_document(path: &Path, records: &[Value]) -> Result<(), TransformError> {
    let json = render_document(records)?;
    std::fs::write(path, json).map_err(|source| TransformError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a spreadsheet to a JSON file.
///
/// This is the main entry point for the pipeline. It:
/// 1. Loads the selected sheet
/// 2. Validates that every mapped column exists
/// 3. Builds one record per row
/// 4. Writes the JSON array to the output path
pub fn convert(options: &ConvertOptions) -> PipelineResult<ConvertReport> {
    let document = build_document(&options.input, &options.sheet, &options.schema)?;

    log_info(format!("💾 Writing {}", options.output.display()));
    write_document(&options.output, &document.records)?;
    log_info_indent(format!("{} bytes of JSON", document_size(&options.output)), 1);

    Ok(ConvertReport {
        output: options.output.clone(),
        sheet_name: document.sheet_name,
        record_count: document.records.len(),
    })
}

fn document_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Cell;
    use serde_json::json;

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table::new("Plan1", headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn small_schema() -> SchemaMap {
        SchemaMap::from_pairs([
            ("sku_id", "SKU - ID"),
            ("sku_intake", "SKU - Intake"),
            ("sku_cidade", "SKU - Cidade"),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::new("ofertas.xlsx");
        assert_eq!(opts.output, PathBuf::from("output.json"));
        assert_eq!(opts.sheet, SheetSelector::Index(0));
        assert_eq!(opts.schema.len(), 24);
    }

    #[test]
    fn test_validate_lists_every_missing_column() {
        let t = table(&["SKU - Intake", "Outra"], vec![]);
        let err = validate(&t, &small_schema()).unwrap_err();
        assert_eq!(err.missing_columns(), ["SKU - ID", "SKU - Cidade"]);
    }

    #[test]
    fn test_validate_ok() {
        let t = table(&["SKU - Cidade", "SKU - ID", "SKU - Intake", "Extra"], vec![]);
        assert!(validate(&t, &small_schema()).is_ok());
    }

    #[test]
    fn test_transform_orders_keys_by_schema() {
        let t = table(
            &["SKU - Cidade", "Extra", "SKU - Intake", "SKU - ID"],
            vec![vec![
                Cell::Text("Recife".into()),
                Cell::Int(9),
                Cell::Float(10.0),
                Cell::Float(101.0),
            ]],
        );

        let records = transform(&t, &small_schema());
        assert_eq!(records.len(), 1);

        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["sku_id", "sku_intake", "sku_cidade"]);
        assert_eq!(records[0], json!({"sku_id": 101, "sku_intake": 10, "sku_cidade": "Recife"}));
    }

    #[test]
    fn test_transform_lookup_miss_is_null() {
        // No validation step: an absent column yields null, not an error
        let t = table(&["SKU - ID"], vec![vec![Cell::Int(1)], vec![Cell::Empty]]);
        let records = transform(&t, &small_schema());

        assert_eq!(records[0], json!({"sku_id": 1, "sku_intake": null, "sku_cidade": null}));
        assert_eq!(records[1], json!({"sku_id": null, "sku_intake": null, "sku_cidade": null}));
    }

    #[test]
    fn test_transform_preserves_row_order() {
        let rows = (0..50).map(|i| vec![Cell::Float(i as f64)]).collect();
        let t = table(&["SKU - ID"], rows);
        let records = transform(&t, &small_schema());

        let ids: Vec<i64> = records.iter().map(|r| r["sku_id"].as_i64().unwrap()).collect();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_render_document_format() {
        let json = render_document(&[json!({"curso_duracao": "4 anos", "habilitacao_nome": "Ciência"})]).unwrap();
        assert_eq!(
            json,
            "[\n  {\n    \"curso_duracao\": \"4 anos\",\n    \"habilitacao_nome\": \"Ciência\"\n  }\n]"
        );
        assert_eq!(render_document(&[]).unwrap(), "[]");
    }
}
