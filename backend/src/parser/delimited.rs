//! Delimited text reader with encoding and delimiter auto-detection.
//!
//! A CSV file is treated as a workbook with a single sheet named after the
//! file stem. Column types are inferred per column: a column whose non-missing
//! values all parse as integers loads as [`Cell::Int`], all numeric as
//! [`Cell::Float`], all `true`/`false` as [`Cell::Bool`]; anything else stays
//! text.

use std::path::Path;

use super::{is_na_marker, Cell, SheetSelector, Table};
use crate::error::{InputError, InputResult};

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding. Never fails: unknown
/// encodings fall back to lossy UTF-8. A leading byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "iso-8859-15" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load a CSV file as a single-sheet table.
pub fn load_csv(path: &Path, sheet: &SheetSelector) -> InputResult<Table> {
    let sheet_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    sheet.resolve(std::slice::from_ref(&sheet_name))?;

    let bytes = std::fs::read(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    parse_csv_bytes(&bytes, sheet_name).map_err(|message| InputError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8], sheet_name: String) -> Result<Table, String> {
    // Valid UTF-8 is taken as is; chardet is unreliable on short samples
    let encoding = match std::str::from_utf8(bytes) {
        Ok(_) => "utf-8".to_string(),
        Err(_) => detect_encoding(bytes),
    };
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(header) => header
            .map_err(|e| format!("cannot read header: {}", e))?
            .iter()
            .map(String::from)
            .collect(),
        None => return Ok(Table::new(sheet_name, Vec::new(), Vec::new())),
    };

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in records.enumerate() {
        // +1 for 0-index, +1 for header
        let record = record.map_err(|e| format!("line {}: {}", idx + 2, e))?;
        raw_rows.push(record.iter().map(String::from).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_kind(raw_rows.iter().filter_map(|row| row.get(col))))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(kinds.iter())
                .map(|(value, kind)| kind.cell(value))
                .collect()
        })
        .collect();

    Ok(Table::new(sheet_name, headers, rows))
}

/// Inferred type of a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn cell(self, value: String) -> Cell {
        if is_na_marker(&value) {
            return Cell::Empty;
        }
        let trimmed = value.trim();
        match self {
            ColumnKind::Int => trimmed.parse().map(Cell::Int).unwrap_or(Cell::Text(value)),
            ColumnKind::Float => trimmed.parse().map(Cell::Float).unwrap_or(Cell::Text(value)),
            ColumnKind::Bool => parse_bool(trimmed).map(Cell::Bool).unwrap_or(Cell::Text(value)),
            ColumnKind::Text => Cell::Text(value),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a String>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;

    for value in values.filter(|v| !is_na_marker(v)) {
        let v = value.trim();
        let this = if v.parse::<i64>().is_ok() {
            ColumnKind::Int
        } else if v.parse::<f64>().is_ok_and(|f| f.is_finite()) {
            ColumnKind::Float
        } else if parse_bool(v).is_some() {
            ColumnKind::Bool
        } else {
            return ColumnKind::Text;
        };

        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }

    kind.unwrap_or(ColumnKind::Text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Table {
        parse_csv_bytes(csv.as_bytes(), "ofertas".to_string()).unwrap()
    }

    #[test]
    fn test_semicolon_csv() {
        let table = parse("SKU - ID;SKU - Cidade\n101;Recife\n102;Natal");

        assert_eq!(table.headers, vec!["SKU - ID", "SKU - Cidade"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "SKU - ID"), Some(&Cell::Int(101)));
        assert_eq!(table.get(1, "SKU - Cidade"), Some(&Cell::Text("Natal".into())));
    }

    #[test]
    fn test_quoted_values_with_delimiter() {
        let table = parse("name,value\n\"Silva, Ana\",\"10.5\"");

        assert_eq!(table.get(0, "name"), Some(&Cell::Text("Silva, Ana".into())));
        assert_eq!(table.get(0, "value"), Some(&Cell::Float(10.5)));
    }

    #[test]
    fn test_mixed_numeric_column_is_float() {
        let table = parse("a;b\n1;x\n2.5;\nNA;y");

        assert_eq!(table.get(0, "a"), Some(&Cell::Float(1.0)));
        assert_eq!(table.get(1, "a"), Some(&Cell::Float(2.5)));
        assert_eq!(table.get(2, "a"), Some(&Cell::Empty));
        assert_eq!(table.get(1, "b"), Some(&Cell::Empty));
    }

    #[test]
    fn test_text_column_keeps_numbers_as_text() {
        let table = parse("code\n00123\nABC");
        assert_eq!(table.get(0, "code"), Some(&Cell::Text("00123".into())));
    }

    #[test]
    fn test_bool_column() {
        let table = parse("flag\nTrue\nfalse");
        assert_eq!(table.get(0, "flag"), Some(&Cell::Bool(true)));
        assert_eq!(table.get(1, "flag"), Some(&Cell::Bool(false)));
    }

    #[test]
    fn test_short_rows_padded() {
        let table = parse("a;b;c\n1;;3\n4");

        assert_eq!(table.get(0, "b"), Some(&Cell::Empty));
        assert_eq!(table.get(1, "c"), Some(&Cell::Empty));
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        let table = parse("");
        assert!(table.headers.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Duração" in ISO-8859-1
        let bytes: &[u8] = &[0x44, 0x75, 0x72, 0x61, 0xE7, 0xE3, 0x6F];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Duração");
    }

    #[test]
    fn test_bom_stripped() {
        let bytes = "\u{feff}SKU - ID\n1".as_bytes();
        let table = parse_csv_bytes(bytes, "x".into()).unwrap();
        assert_eq!(table.headers, vec!["SKU - ID"]);
    }

    #[test]
    fn test_sheet_selector_for_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ofertas.csv");
        std::fs::write(&path, "a\n1").unwrap();

        assert!(load_csv(&path, &SheetSelector::default()).is_ok());
        assert!(load_csv(&path, &SheetSelector::from("ofertas")).is_ok());
        assert!(matches!(
            load_csv(&path, &SheetSelector::Index(1)),
            Err(InputError::SheetNotFound { .. })
        ));
    }
}
