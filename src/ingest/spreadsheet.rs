/// Workbook reader for the field-data sheet.
///
/// Opens an `.xlsx`/`.xls`/`.ods` workbook with calamine and maps one
/// named sheet into a `Table`. The first row is the header; blank header
/// cells are named `Unnamed: <index>`.

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::logging::{self, Stage};
use crate::model::{CellValue, Table, WqError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Load one sheet of a workbook into a `Table`.
///
/// # Errors
/// - `FileNotFound` if `path` does not exist
/// - `SheetNotFound` if the workbook has no sheet named `sheet`
/// - `Spreadsheet` if the workbook cannot be decoded
pub fn load_sheet<P: AsRef<Path>>(path: P, sheet: &str) -> Result<Table, WqError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WqError::FileNotFound(path.to_path_buf()));
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| WqError::Spreadsheet(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(WqError::SheetNotFound(sheet.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| WqError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_name(i, cell))
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push(row.iter().map(convert_cell).collect());
    }

    logging::info(
        Stage::Ingest,
        Some(&path.display().to_string()),
        &format!("Loaded {} rows x {} columns from '{}'", table.len(), table.columns.len(), sheet),
    );

    Ok(table)
}

fn header_name(index: usize, cell: &Data) -> String {
    let name = match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if name.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        name
    }
}

/// Map one calamine cell onto the table model.
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => excel_serial_to_cell(dt.as_f64()),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(CellValue::Date))
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Convert an Excel serial (days since 1899-12-30) to a datetime.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * SECONDS_PER_DAY).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

/// Serials below one day are a time of day; integral serials are dates.
fn excel_serial_to_cell(serial: f64) -> CellValue {
    match excel_serial_to_datetime(serial) {
        Some(dt) if serial < 1.0 => CellValue::Time(dt.time()),
        Some(dt) if serial.fract() == 0.0 => CellValue::Date(dt.date()),
        Some(dt) => CellValue::DateTime(dt),
        None => CellValue::Missing,
    }
}
