/// Field-sheet ingest for the water-quality pipeline.
///
/// Submodules:
/// - `spreadsheet` — reads one workbook sheet into a `Table`.
/// - `clean` — missing-value normalization and timestamp assembly.
/// - `cache` — write-once CSV copy of the cleaned table.

pub mod cache;
pub mod clean;
pub mod spreadsheet;

pub use cache::{CacheOutcome, write_cache_once};
pub use clean::clean;
pub use spreadsheet::load_sheet;

use std::path::Path;

use crate::model::{Table, WqError};

/// Load and clean a sheet in one step.
pub fn load_clean<P: AsRef<Path>>(path: P, sheet: &str) -> Result<Table, WqError> {
    clean(load_sheet(path, sheet)?)
}
