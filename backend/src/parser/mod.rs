//! Spreadsheet loading into an in-memory [`Table`].
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read with
//! calamine; delimited text (`.csv`, `.tsv`, `.txt`) goes through the CSV
//! reader with encoding and delimiter auto-detection. Both produce the same
//! shape: one header row of column labels and a list of raw [`Cell`] rows.

pub mod delimited;
pub mod workbook;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{InputError, InputResult};

pub use self::delimited::{decode_content, detect_delimiter, detect_encoding, load_csv, parse_csv_bytes};
pub use self::workbook::load_workbook;

/// Text values read as missing, matching the usual dataframe defaults.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true if a text cell should load as missing.
pub fn is_na_marker(text: &str) -> bool {
    NA_MARKERS.contains(&text)
}

/// A raw cell value as read from the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Date and time without offset
    DateTime(NaiveDateTime),
    /// Date and time with a UTC offset
    DateTimeTz(DateTime<FixedOffset>),
    /// Elapsed time (Excel `[h]:mm:ss` cells)
    Duration(chrono::Duration),
    /// Spreadsheet error cell such as `#DIV/0!`
    Error(String),
}

impl Cell {
    /// Build a text cell, mapping missing-value markers to [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if is_na_marker(&value) {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Cell::DateTimeTz(dt) => write!(f, "{}", dt.to_rfc3339()),
            Cell::Duration(d) => write!(f, "{}s", d.num_seconds()),
            Cell::Error(e) => f.write_str(e),
        }
    }
}

/// Which worksheet to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based sheet position
    Index(usize),
    /// Sheet name. A name made only of digits falls back to an index
    /// when no sheet carries that name.
    Name(String),
}

impl SheetSelector {
    /// Pick the sheet among `names`, returning its position.
    pub fn resolve(&self, names: &[String]) -> InputResult<usize> {
        let found = match self {
            SheetSelector::Index(i) => (*i < names.len()).then_some(*i),
            SheetSelector::Name(name) => names.iter().position(|n| n == name).or_else(|| {
                name.parse::<usize>()
                    .ok()
                    .filter(|i| *i < names.len())
            }),
        };

        found.ok_or_else(|| InputError::SheetNotFound {
            selector: self.to_string(),
            available: names.to_vec(),
        })
    }
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    /// Digits are kept as a name so that a sheet literally called "2024"
    /// still wins over the third sheet; see [`SheetSelector::resolve`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SheetSelector::Name(s.to_string()))
    }
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "#{}", i),
            SheetSelector::Name(n) => write!(f, "'{}'", n),
        }
    }
}

/// A fully loaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the sheet the table was read from
    pub sheet_name: String,
    /// Column labels, unique
    pub headers: Vec<String>,
    /// Data rows, each as wide as `headers`
    pub rows: Vec<Vec<Cell>>,
    index: HashMap<String, usize>,
}

impl Table {
    /// Build a table from raw header labels and rows.
    ///
    /// Labels are made unique (`X`, `X.1`, `X.2`, ...), blank labels become
    /// `Unnamed: N`, rows are padded or cut to the header width and trailing
    /// blank rows are dropped.
    pub fn new(sheet_name: impl Into<String>, raw_headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = dedupe_headers(raw_headers);
        let width = headers.len();

        let mut rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        while rows.last().is_some_and(|row| row.iter().all(Cell::is_empty)) {
            rows.pop();
        }

        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        Self {
            sheet_name: sheet_name.into(),
            headers,
            rows,
            index,
        }
    }

    /// Position of a column label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Cell at `row` under column `label`, if both exist.
    pub fn get(&self, row: usize, label: &str) -> Option<&Cell> {
        let col = self.column_index(label)?;
        self.rows.get(row)?.get(col)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Make header labels unique and fill blank ones.
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (i, label) in raw.into_iter().enumerate() {
        let label = if label.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            label
        };

        let unique = if seen.contains(&label) {
            let counter = counts.entry(label.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}.{}", label, counter);
                if !seen.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            label
        };

        seen.insert(unique.clone());
        headers.push(unique);
    }

    headers
}

/// Returns true if the path should be read as delimited text.
pub fn is_delimited_text(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "csv" | "tsv" | "txt"))
        .unwrap_or(false)
}

/// Load one sheet of a spreadsheet file.
///
/// # Example
/// ```ignore
/// use offersheet::{load, SheetSelector};
///
/// let table = load("ofertas.xlsx", &SheetSelector::default())?;
/// println!("{} rows, columns: {}", table.row_count(), table.headers.join(", "));
/// ```
pub fn load(path: impl AsRef<Path>, sheet: &SheetSelector) -> InputResult<Table> {
    let path = path.as_ref();

    // Surface missing/unreadable files before any format sniffing.
    std::fs::File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if is_delimited_text(path) {
        load_csv(path, sheet)
    } else {
        load_workbook(path, sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_by_index() {
        let sheets = names(&["Plan1", "Ofertas"]);
        assert_eq!(SheetSelector::Index(1).resolve(&sheets).unwrap(), 1);
        assert!(SheetSelector::Index(2).resolve(&sheets).is_err());
    }

    #[test]
    fn test_resolve_name_wins_over_index() {
        let sheets = names(&["Resumo", "Plan2", "1"]);
        assert_eq!("1".parse::<SheetSelector>().unwrap().resolve(&sheets).unwrap(), 2);
    }

    #[test]
    fn test_resolve_digit_name_falls_back_to_index() {
        let sheets = names(&["Resumo", "Ofertas"]);
        assert_eq!("1".parse::<SheetSelector>().unwrap().resolve(&sheets).unwrap(), 1);
    }

    #[test]
    fn test_resolve_unknown_name_lists_sheets() {
        let sheets = names(&["Resumo", "Ofertas"]);
        let err = SheetSelector::from("Missing").resolve(&sheets).unwrap_err();
        match err {
            InputError::SheetNotFound { selector, available } => {
                assert_eq!(selector, "'Missing'");
                assert_eq!(available, sheets);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_headers_deduplicated() {
        let headers = dedupe_headers(names(&["A", "B", "A", "", "A", "A.1"]));
        assert_eq!(headers, names(&["A", "B", "A.1", "Unnamed: 3", "A.2", "A.1.1"]));
    }

    #[test]
    fn test_table_pads_rows_and_drops_trailing_blanks() {
        let table = Table::new(
            "Plan1",
            names(&["a", "b"]),
            vec![
                vec![Cell::Int(1)],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::Int(3), Cell::Text("x".into())],
                vec![Cell::Empty],
                vec![],
            ],
        );

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get(0, "b"), Some(&Cell::Empty));
        assert_eq!(table.get(1, "a"), Some(&Cell::Empty));
        assert_eq!(table.get(2, "b"), Some(&Cell::Text("x".into())));
        assert_eq!(table.get(0, "missing"), None);
        assert_eq!(table.get(9, "a"), None);
    }

    #[test]
    fn test_na_markers_load_as_empty() {
        assert_eq!(Cell::text("NA"), Cell::Empty);
        assert_eq!(Cell::text("#N/A"), Cell::Empty);
        assert_eq!(Cell::text(""), Cell::Empty);
        assert_eq!(Cell::text("Noite"), Cell::Text("Noite".into()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/nonexistent/ofertas.xlsx", &SheetSelector::default()).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }));
    }
}
