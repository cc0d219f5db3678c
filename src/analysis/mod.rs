/// Statistics behind each figure.
///
/// Submodules:
/// - `groupings` — filters, coerces, and partitions (x, y) pairs.
/// - `correlation` — per-group Pearson r / p / r².
/// - `regression` — least-squares line and confidence band.

pub mod correlation;
pub mod groupings;
pub mod regression;

pub use correlation::{Correlation, GroupStats, group_stats, pearson};
pub use groupings::{Group, Observation, Selection, select};
pub use regression::{BandPoint, LinearFit, fit_line};
