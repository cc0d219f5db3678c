/// Field-sheet cleaning: missing-value normalization and timestamp assembly.
///
/// `clean` is idempotent. Running it on its own output yields the same
/// table, because parsed dates/times pass through unchanged and the
/// timestamp column is rebuilt in place.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::ingest::spreadsheet::excel_serial_to_datetime;
use crate::logging::{self, Stage};
use crate::model::{CellValue, COL_DATE, COL_TIME, COL_TIMESTAMP, SENTINEL_MISSING, Table, WqError};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I:%M:%S%p",
    "%I:%M%p",
];

/// Clean a freshly loaded table.
///
/// 1. Sentinel `-999999` and blank text become `Missing`.
/// 2. The `Date` column is parsed to calendar dates.
/// 3. `datetime` = Date + Time (midnight when Time is missing, missing
///    when Date is missing), appended or replaced.
///
/// Tables without Date/Time columns skip steps 2 and 3.
pub fn clean(mut table: Table) -> Result<Table, WqError> {
    let width = table.columns.len();
    let mut normalized = 0usize;
    for record in &mut table.records {
        record.cells.resize(width, CellValue::Missing);
        for cell in &mut record.cells {
            if is_missing_marker(cell) {
                *cell = CellValue::Missing;
                normalized += 1;
            }
        }
    }
    logging::debug(
        Stage::Clean,
        None,
        &format!("Normalized {} sentinel/blank cells to missing", normalized),
    );

    let Some(date_idx) = table.find_column(COL_DATE) else {
        logging::warn(Stage::Clean, None, "No Date column; timestamp not built");
        return Ok(table);
    };
    let time_idx = table.find_column(COL_TIME);

    let mut timestamps = Vec::with_capacity(table.len());
    for (row, record) in table.records.iter_mut().enumerate() {
        let date = parse_date(&record.cells[date_idx])
            .map_err(|msg| WqError::DateParse(format!("row {}: {}", row + 2, msg)))?;
        record.cells[date_idx] = date.map(CellValue::Date).unwrap_or(CellValue::Missing);

        let time = match time_idx {
            Some(idx) => parse_time(&record.cells[idx])
                .map_err(|msg| WqError::DateParse(format!("row {}: {}", row + 2, msg)))?,
            None => None,
        };

        let stamp = date.map(|d| d.and_time(time.unwrap_or(NaiveTime::MIN)));
        timestamps.push(stamp.map(CellValue::DateTime).unwrap_or(CellValue::Missing));
    }

    let ts_idx = match table.find_column(COL_TIMESTAMP) {
        Some(idx) => idx,
        None => {
            table.columns.push(COL_TIMESTAMP.to_string());
            table.columns.len() - 1
        }
    };
    for (record, stamp) in table.records.iter_mut().zip(timestamps) {
        record.cells.resize(table.columns.len(), CellValue::Missing);
        record.cells[ts_idx] = stamp;
    }

    logging::info(Stage::Clean, None, &format!("Cleaned {} rows", table.len()));
    Ok(table)
}

fn is_missing_marker(cell: &CellValue) -> bool {
    match cell {
        CellValue::Number(v) => *v == SENTINEL_MISSING,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a Date cell with flexible format inference.
/// `Ok(None)` for missing cells; `Err` for values no format accepts.
pub fn parse_date(cell: &CellValue) -> Result<Option<NaiveDate>, String> {
    match cell {
        CellValue::Missing => Ok(None),
        CellValue::Date(d) => Ok(Some(*d)),
        CellValue::DateTime(dt) => Ok(Some(dt.date())),
        CellValue::Number(serial) => excel_serial_to_datetime(*serial)
            .map(|dt| Some(dt.date()))
            .ok_or_else(|| format!("'{}' is not a date serial", serial)),
        CellValue::Text(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .or_else(|| parse_datetime_text(s).map(|dt| dt.date()))
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a recognized date", s))
        }
        CellValue::Time(t) => Err(format!("'{}' is a time, not a date", t)),
    }
}

/// Parse a Time cell. Accepts 24h and 12h clock text, Excel day fractions,
/// and the time part of date-time cells.
pub fn parse_time(cell: &CellValue) -> Result<Option<NaiveTime>, String> {
    match cell {
        CellValue::Missing | CellValue::Date(_) => Ok(None),
        CellValue::Time(t) => Ok(Some(*t)),
        CellValue::DateTime(dt) => Ok(Some(dt.time())),
        CellValue::Number(fraction) => excel_serial_to_datetime(fraction.fract())
            .map(|dt| Some(dt.time()))
            .ok_or_else(|| format!("'{}' is not a time of day", fraction)),
        CellValue::Text(s) => {
            let s = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .or_else(|| parse_datetime_text(s).map(|dt| dt.time()))
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a recognized time", s))
        }
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
