/// Measurement column registry for the Colorado field sheet.
///
/// Defines the canonical measurement columns the default plots use and
/// any fixed axis range. Other modules should reference
/// column names from here rather than hardcoding header strings.

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Metadata for one numeric measurement column of the field sheet.
pub struct MeasurementColumn {
    /// Header text exactly as it appears in the spreadsheet.
    pub name: &'static str,
    /// Fixed axis bounds when this column is plotted on x, if the quantity
    /// has a conventional display range.
    pub axis_bounds: Option<(f64, f64)>,
}

pub const PH: &str = "pH";
pub const CONDUCTIVITY: &str = "Conductivity (uS/cm)";
pub const TEMPERATURE: &str = "Temp (C)";
pub const ELEVATION: &str = "Elevation (m)";

/// Display range used for pH axes.
pub const PH_AXIS_BOUNDS: (f64, f64) = (4.0, 10.0);

pub static MEASUREMENT_COLUMNS: &[MeasurementColumn] = &[
    MeasurementColumn {
        name: PH,
        axis_bounds: Some(PH_AXIS_BOUNDS),
    },
    MeasurementColumn {
        name: CONDUCTIVITY,
        axis_bounds: None,
    },
    MeasurementColumn {
        name: TEMPERATURE,
        axis_bounds: None,
    },
    MeasurementColumn {
        name: ELEVATION,
        axis_bounds: None,
    },
];

/// Looks up a measurement column by header name. Returns `None` if not found.
pub fn find_column(name: &str) -> Option<&'static MeasurementColumn> {
    MEASUREMENT_COLUMNS.iter().find(|c| c.name == name)
}

/// Axis bounds registered for a column, if any.
pub fn axis_bounds_for(name: &str) -> Option<(f64, f64)> {
    find_column(name).and_then(|c| c.axis_bounds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
