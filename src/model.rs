/// Core data types for the water-quality plotting pipeline.
///
/// This module defines the shared table model imported by all other
/// modules: cell values, records, the table itself, and the crate error
/// type. It contains no I/O.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Column names and sentinels
// ---------------------------------------------------------------------------

/// Spreadsheet sentinel for "no reading". Normalized to `CellValue::Missing`.
pub const SENTINEL_MISSING: f64 = -999_999.0;

pub const COL_WATERSHED: &str = "Watershed";
pub const COL_BRANCH: &str = "Branch";
pub const COL_DATE: &str = "Date";
pub const COL_TIME: &str = "Time";

/// Column produced by the cleaning step from Date + Time.
pub const COL_TIMESTAMP: &str = "datetime";

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single spreadsheet cell after ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric coercion used by the plotter. Numeric text is accepted;
    /// dates, times and other text are not.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Label used when the cell acts as a category (watershed, branch).
    /// Returns `None` for missing cells.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            // Debug keeps the decimal point on whole values ("7.0", not "7").
            CellValue::Number(v) => write!(f, "{:?}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// ---------------------------------------------------------------------------
// Records and tables
// ---------------------------------------------------------------------------

static MISSING: CellValue = CellValue::Missing;

/// One field measurement: a row of cells aligned with `Table::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&MISSING)
    }
}

/// Ordered records as loaded from the spreadsheet.
///
/// Mutated only by `ingest::clean`; the plotter treats it as read-only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Missing);
        self.records.push(Record::new(cells));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column lookup that fails the way a bad key would.
    pub fn column_index(&self, name: &str) -> Result<usize, WqError> {
        self.find_column(name)
            .ok_or_else(|| WqError::ColumnNotFound(name.to_string()))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&CellValue>, WqError> {
        let idx = self.column_index(name)?;
        Ok(self.records.iter().map(|r| r.get(idx)).collect())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while loading, cleaning, or plotting field data.
#[derive(Debug, PartialEq)]
pub enum WqError {
    /// The source workbook does not exist.
    FileNotFound(PathBuf),
    /// The workbook exists but has no sheet with this name.
    SheetNotFound(String),
    /// The workbook could not be opened or decoded.
    Spreadsheet(String),
    /// A requested column is not in the table.
    ColumnNotFound(String),
    /// A plotted column holds a value that is not numeric.
    TypeConversion { column: String, value: String },
    /// A Date or Time cell could not be parsed.
    DateParse(String),
    /// CSV cache could not be written.
    Csv(String),
    Io(String),
    /// Figure rendering failed.
    Plot(String),
    /// Configuration file missing fields or malformed.
    Config(String),
}

impl fmt::Display for WqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WqError::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            WqError::SheetNotFound(sheet) => write!(f, "Sheet not found: {}", sheet),
            WqError::Spreadsheet(msg) => write!(f, "Spreadsheet error: {}", msg),
            WqError::ColumnNotFound(col) => write!(f, "Column not found: {}", col),
            WqError::TypeConversion { column, value } => {
                write!(f, "Cannot convert '{}' in column '{}' to a number", value, column)
            }
            WqError::DateParse(msg) => write!(f, "Date parse error: {}", msg),
            WqError::Csv(msg) => write!(f, "CSV error: {}", msg),
            WqError::Io(msg) => write!(f, "I/O error: {}", msg),
            WqError::Plot(msg) => write!(f, "Plot error: {}", msg),
            WqError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for WqError {}

impl From<std::io::Error> for WqError {
    fn from(err: std::io::Error) -> Self {
        WqError::Io(err.to_string())
    }
}

impl From<csv::Error> for WqError {
    fn from(err: csv::Error) -> Self {
        WqError::Csv(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::new(vec![COL_WATERSHED.to_string(), "pH".to_string()]);
        table.push(vec![CellValue::Text("Boulder".into()), CellValue::Number(7.2)]);
        table.push(vec![CellValue::Text("Clear".into())]);
        table
    }

    #[test]
    fn test_push_pads_short_rows_with_missing() {
        let table = sample_table();
        assert_eq!(table.records[1].cells.len(), 2);
        assert!(table.records[1].get(1).is_missing());
    }

    #[test]
    fn test_unknown_column_is_column_not_found() {
        let table = sample_table();
        assert_eq!(
            table.column_index("Turbidity"),
            Err(WqError::ColumnNotFound("Turbidity".to_string()))
        );
    }

    #[test]
    fn test_to_number_accepts_numeric_text_only() {
        assert_eq!(CellValue::Number(3.5).to_number(), Some(3.5));
        assert_eq!(CellValue::Text(" 8.1 ".into()).to_number(), Some(8.1));
        assert_eq!(CellValue::Text("n/a".into()).to_number(), None);
        assert_eq!(CellValue::Missing.to_number(), None);
    }

    #[test]
    fn test_labels_for_categories() {
        assert_eq!(CellValue::Text("Boulder".into()).as_label().as_deref(), Some("Boulder"));
        assert_eq!(CellValue::Number(2.0).as_label().as_deref(), Some("2.0"));
        assert_eq!(CellValue::Missing.as_label(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = WqError::TypeConversion {
            column: "pH".into(),
            value: "seven".into(),
        };
        assert_eq!(err.to_string(), "Cannot convert 'seven' in column 'pH' to a number");
        assert_eq!(
            WqError::SheetNotFound("Field Data".into()).to_string(),
            "Sheet not found: Field Data"
        );
    }
}
