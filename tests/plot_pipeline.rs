/// Integration tests for the clean → cache → plot pipeline
///
/// Tests verify:
/// 1. Cleaning normalizes sentinels and is idempotent
/// 2. The CSV cache is written once and never overwritten
/// 3. Per-group statistics and legend labels
/// 4. Missing-value exclusion, focus filtering, pooled annotation
/// 5. Fixed pH axis bounds
/// 6. Sheet lookup in a real workbook
/// 7. PNG output sized for the requested DPI
///
/// Most tables are built in memory; the workbook tests read a small
/// checked-in fixture.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use wq_plots::analysis::GroupStats;
use wq_plots::ingest::{CacheOutcome, clean, load_sheet, write_cache_once};
use wq_plots::model::{COL_BRANCH, COL_DATE, COL_TIME, COL_TIMESTAMP, COL_WATERSHED};
use wq_plots::plot::LegendMarker;
use wq_plots::{CellValue, PlotOptions, Table, WqError, plotter};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const X: &str = "pH";
const Y: &str = "Elevation (m)";

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn num(v: f64) -> CellValue {
    CellValue::Number(v)
}

/// A raw sheet as it comes out of the workbook, sentinels and blanks included.
fn field_sheet() -> Table {
    let mut table = Table::new(vec![
        COL_WATERSHED.into(),
        COL_BRANCH.into(),
        COL_DATE.into(),
        COL_TIME.into(),
        X.into(),
        Y.into(),
    ]);
    let rows = [
        ("A", "North", "2023-06-01", "09:00", 1.0, 2.0),
        ("A", "North", "2023-06-01", "09:30", 2.0, 4.0),
        ("A", "South", "2023-06-02", "10:15", 3.0, 6.0),
        ("B", "Main", "06/03/2023", "2:00 PM", 5.0, 9.0),
    ];
    for (shed, branch, date, time, x, y) in rows {
        table.push(vec![text(shed), text(branch), text(date), text(time), num(x), num(y)]);
    }
    // Sentinel pH and a blank elevation: both rows must drop out of plots.
    table.push(vec![text("B"), text("Main"), text("2023-06-04"), text("11:00"), num(-999999.0), num(8.0)]);
    table.push(vec![text("A"), text("North"), text("2023-06-05"), text(""), num(4.0), text("  ")]);
    table
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("wq_plots_it_{}_{}.csv", name, std::process::id()))
}

fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Width and height from a PNG's IHDR chunk.
fn png_dimensions(path: &std::path::Path) -> (u32, u32) {
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n", "not a PNG: {}", path.display());
    assert_eq!(&bytes[12..16], b"IHDR");
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    (width, height)
}

// ---------------------------------------------------------------------------
// Cleaning and cache
// ---------------------------------------------------------------------------

#[test]
fn test_cleaning_twice_yields_identical_table() {
    let once = clean(field_sheet()).unwrap();
    let twice = clean(once.clone()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.columns.last().map(String::as_str), Some(COL_TIMESTAMP));
}

#[test]
fn test_cleaning_normalizes_sentinel_and_blanks() {
    let cleaned = clean(field_sheet()).unwrap();
    let ph = cleaned.column(X).unwrap();
    let elevation = cleaned.column(Y).unwrap();
    assert!(ph[4].is_missing());
    assert!(elevation[5].is_missing());

    let stamps = cleaned.column(COL_TIMESTAMP).unwrap();
    let expected = NaiveDate::from_ymd_opt(2023, 6, 3).unwrap().and_hms_opt(14, 0, 0).unwrap();
    assert_eq!(stamps[3], &CellValue::DateTime(expected));
}

#[test]
fn test_cache_written_once() {
    let path = temp_path("cache");
    let _ = std::fs::remove_file(&path);

    let cleaned = clean(field_sheet()).unwrap();
    assert_eq!(write_cache_once(&cleaned, &path).unwrap(), CacheOutcome::Written);
    let first = std::fs::read_to_string(&path).unwrap();
    assert!(first.starts_with("Watershed,Branch,Date,Time,pH,Elevation (m),datetime"));

    let recleaned = clean(cleaned).unwrap();
    assert_eq!(write_cache_once(&recleaned, &path).unwrap(), CacheOutcome::Skipped);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first);

    let _ = std::fs::remove_file(&path);
}

// ---------------------------------------------------------------------------
// Grouped plots
// ---------------------------------------------------------------------------

#[test]
fn test_example_groups_a_and_b() {
    let table = clean(field_sheet()).unwrap();
    let plan = plotter(&table, X, Y, &PlotOptions::default()).unwrap();

    let a = plan.stats_for("A").and_then(GroupStats::correlation).copied().unwrap();
    assert_abs_diff_eq!(a.r, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(a.r_squared, 1.0, epsilon = 1e-12);
    assert!(a.p_value.is_finite());

    assert_eq!(plan.stats_for("B"), Some(&GroupStats::Insufficient { n: 1 }));

    let legend = plan.legend.as_ref().unwrap();
    assert_eq!(legend.title, "Watershed");
    assert_eq!(legend.entries.len(), 2);
    assert!(legend.entries[0].label.starts_with("A\n    r²=1.00\n    r=1.00\n    p="));
    assert_eq!(legend.entries[1].label, "B (insufficient data)");
    assert_eq!(legend.entries[1].marker, LegendMarker::Series { color_index: 1 });
}

#[test]
fn test_plotted_points_equal_rows_with_both_fields() {
    let table = clean(field_sheet()).unwrap();
    let plan = plotter(&table, X, Y, &PlotOptions::default()).unwrap();
    // A has four rows, one without elevation; B has two, one with sentinel pH.
    assert_eq!(plan.plotted_points("A"), 3);
    assert_eq!(plan.plotted_points("B"), 1);
    assert!(plan.series.iter().all(|s| s.points.iter().all(|p| p.0 != -999999.0)));
}

#[test]
fn test_ph_axis_bounds_are_fixed() {
    let table = clean(field_sheet()).unwrap();
    let options = PlotOptions {
        ph_axis: true,
        ..PlotOptions::default()
    };
    let plan = plotter(&table, X, Y, &options).unwrap();
    assert_eq!(plan.x_range, (4.0, 10.0));

    let free = plotter(&table, X, Y, &PlotOptions::default()).unwrap();
    assert_ne!(free.x_range, (4.0, 10.0));
}

#[test]
fn test_focus_with_branch_grouping() {
    let table = clean(field_sheet()).unwrap();
    let options = PlotOptions {
        focus: Some("A".to_string()),
        group_by: COL_BRANCH.to_string(),
        ..PlotOptions::default()
    };
    let plan = plotter(&table, X, Y, &options).unwrap();
    let groups: Vec<&str> = plan.stats.iter().map(|(g, _)| g.as_str()).collect();
    assert_eq!(groups, vec!["North", "South"]);
    assert!(plan.stats_for("Main").is_none());

    let legend = plan.legend.as_ref().unwrap();
    assert_eq!(legend.title, "Watershed");
    assert_eq!(legend.entries[1].label, "South (insufficient data)");
}

#[test]
fn test_single_group_still_gets_a_legend() {
    let table = clean(field_sheet()).unwrap();
    let options = PlotOptions {
        focus: Some("A".to_string()),
        ..PlotOptions::default()
    };
    let plan = plotter(&table, X, Y, &options).unwrap();
    let legend = plan.legend.as_ref().unwrap();
    assert_eq!(legend.entries.len(), 1);
    assert!(legend.entries[0].label.starts_with("A\n"));
}

#[test]
fn test_group_outside_fixed_axis_gets_generic_marker() {
    // A's pH readings (1-3) all fall left of the 4-10 pH axis.
    let table = clean(field_sheet()).unwrap();
    let options = PlotOptions {
        focus: Some("A".to_string()),
        ph_axis: true,
        ..PlotOptions::default()
    };
    let plan = plotter(&table, X, Y, &options).unwrap();
    let legend = plan.legend.as_ref().unwrap();
    assert_eq!(legend.entries.len(), 1);
    assert_eq!(legend.entries[0].marker, LegendMarker::Generic);
    assert!(legend.entries[0].label.starts_with("A\n    r²=1.00"));
    assert_eq!(plan.plotted_points("A"), 3);
}

#[test]
fn test_strongly_correlated_group_shows_tiny_p() {
    let mut table = Table::new(vec![COL_WATERSHED.into(), X.into(), Y.into()]);
    for i in 1..=30 {
        let x = i as f64;
        let y = if i % 2 == 1 { x + 0.5 } else { x - 0.5 };
        table.push(vec![text("Fourmile"), num(x), num(y)]);
    }
    let plan = plotter(&table, X, Y, &PlotOptions::default()).unwrap();
    let label = &plan.legend.as_ref().unwrap().entries[0].label;
    assert!(label.ends_with("\n    p=3.2e-36"), "label was {:?}", label);
}

// ---------------------------------------------------------------------------
// Pooled plots
// ---------------------------------------------------------------------------

#[test]
fn test_pooled_plot_annotates_instead_of_legend() {
    let table = clean(field_sheet()).unwrap();
    let options = PlotOptions {
        per_group: false,
        ci: None,
        ..PlotOptions::default()
    };
    let plan = plotter(&table, X, Y, &options).unwrap();
    assert!(plan.legend.is_none());
    assert_eq!(plan.series.len(), 1);
    assert_eq!(plan.series[0].points.len(), 4);
    assert!(plan.series[0].fit.as_ref().unwrap().band.is_none());

    let annotation = plan.annotation.as_ref().unwrap();
    let lines: Vec<&str> = annotation.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("r²="));
    assert!(lines[1].starts_with("r="));
    assert!(lines[2].starts_with("p="));
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn test_grouped_and_pooled_figures_render_at_requested_dpi() {
    let table = clean(field_sheet()).unwrap();
    let dpi = 72;

    for (name, per_group) in [("grouped", true), ("pooled", false)] {
        let path = std::env::temp_dir().join(format!("wq_plots_it_{}_{}.png", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        let options = PlotOptions {
            per_group,
            output: Some(path.clone()),
            dpi,
            ..PlotOptions::default()
        };

        let plan = plotter(&table, X, Y, &options).unwrap();
        assert!(path.exists(), "{} figure was not written", name);
        assert_eq!(png_dimensions(&path), plan.pixel_size(dpi));
        let _ = std::fs::remove_file(&path);
    }
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[test]
fn test_workbook_without_field_data_sheet() {
    let err = load_sheet(fixture("summary_only.xlsx"), "Field Data").unwrap_err();
    assert_eq!(err, WqError::SheetNotFound("Field Data".to_string()));
}

#[test]
fn test_workbook_sheet_loads_by_name() {
    let table = load_sheet(fixture("summary_only.xlsx"), "Summary").unwrap();
    assert_eq!(table.columns, vec!["Watershed".to_string(), "pH".to_string()]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.column(X).unwrap()[0], &num(7.2));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_column_fails_immediately() {
    let table = clean(field_sheet()).unwrap();
    let err = plotter(&table, "Dissolved O2 (mg/L)", Y, &PlotOptions::default()).unwrap_err();
    assert_eq!(err, WqError::ColumnNotFound("Dissolved O2 (mg/L)".to_string()));
}

#[test]
fn test_non_numeric_measurement_fails() {
    let mut table = clean(field_sheet()).unwrap();
    table.push(vec![text("B"), text("Main"), CellValue::Missing, CellValue::Missing, text("high"), num(7.0)]);
    let err = plotter(&table, X, Y, &PlotOptions::default()).unwrap_err();
    assert!(matches!(err, WqError::TypeConversion { ref column, .. } if column == X));
}
