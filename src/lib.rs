/// Water-quality field data correlation plots.
///
/// Loads the field-data sheet of a water-quality workbook, normalizes
/// missing values and timestamps, caches the cleaned table as CSV, and
/// draws scatter/regression figures grouped by watershed or branch with
/// per-group Pearson statistics in the legend.

pub mod analysis;
pub mod columns;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod plot;
pub mod report;

pub use model::{CellValue, Record, Table, WqError};
pub use plot::{FigurePlan, PlotOptions, plotter};
