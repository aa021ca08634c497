//! Workbook reader built on calamine.

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

use super::{Cell, SheetSelector, Table};
use crate::error::{InputError, InputResult};

/// Load the selected sheet of a workbook.
pub fn load_workbook(path: &Path, sheet: &SheetSelector) -> InputResult<Table> {
    let parse_err = |message: String| InputError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| parse_err(e.to_string()))?;
    let names = workbook.sheet_names();
    let position = sheet.resolve(&names)?;
    let name = names[position].clone();

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| parse_err(format!("sheet '{}': {}", name, e)))?;

    Ok(range_to_table(name, &range))
}

/// Convert a calamine range to a table: first row is the header.
pub fn range_to_table(sheet_name: String, range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers = match rows.next() {
        Some(header_row) => header_row.iter().map(header_label).collect(),
        None => Vec::new(),
    };

    let data = rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    Table::new(sheet_name, headers, data)
}

/// Header cell as a column label.
fn header_label(data: &Data) -> String {
    match data {
        // NA markers are legitimate header text
        Data::String(s) => s.clone(),
        other => to_cell(other).to_string(),
    }
}

/// Map a calamine value to a raw cell.
pub fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::text(s.as_str()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                dt.as_duration()
                    .map(Cell::Duration)
                    .unwrap_or(Cell::Float(dt.as_f64()))
            } else {
                dt.as_datetime()
                    .map(Cell::DateTime)
                    .unwrap_or(Cell::Float(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s).unwrap_or_else(|| Cell::text(s.as_str())),
        Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

/// Parse the ISO strings some formats (ODS) store for dates.
fn parse_iso_datetime(s: &str) -> Option<Cell> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Cell::DateTimeTz(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Cell::DateTime(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Cell::DateTime)
}
