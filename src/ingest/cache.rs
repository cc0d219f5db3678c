/// Write-once CSV cache of the cleaned table.
///
/// The cache is written the first time the pipeline runs and left alone
/// afterwards. Rows go to a `.partial` sibling that is renamed into place
/// once complete, so a failed write never leaves a cache that later runs
/// would skip. The check is a plain exists-then-write, so two concurrent
/// runs can both write.

use std::path::{Path, PathBuf};

use crate::logging::{self, Stage};
use crate::model::{Table, WqError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Written,
    Skipped,
}

impl std::fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOutcome::Written => write!(f, "written"),
            CacheOutcome::Skipped => write!(f, "skipped (already present)"),
        }
    }
}

/// Write `table` to `path` unless a file is already there.
pub fn write_cache_once<P: AsRef<Path>>(table: &Table, path: P) -> Result<CacheOutcome, WqError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if path.exists() {
        logging::info(Stage::Cache, None, &format!("{} exists, skipping save.", file_name));
        return Ok(CacheOutcome::Skipped);
    }

    let staging = staging_path(path, &file_name);
    if let Err(e) = write_csv(table, &staging) {
        let _ = std::fs::remove_file(&staging);
        logging::log_failure(Stage::Cache, &file_name, "write", &e);
        return Err(e);
    }
    std::fs::rename(&staging, path)?;
    logging::info(
        Stage::Cache,
        Some(&file_name),
        &format!("Wrote {} cleaned rows", table.len()),
    );
    Ok(CacheOutcome::Written)
}

fn staging_path(path: &Path, file_name: &str) -> PathBuf {
    path.with_file_name(format!("{}.partial", file_name))
}

/// Serialize the full table. Missing cells are empty fields.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<(), WqError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for record in &table.records {
        writer.write_record(record.cells.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
