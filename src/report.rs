/// Run Orchestration and Summary
///
/// Runs the whole pipeline from a configuration (load, clean, cache,
/// every configured plot) and collects what happened into a report
/// for the console summary.

use chrono::Utc;
use std::path::PathBuf;

use crate::analysis::GroupStats;
use crate::config::AnalysisConfig;
use crate::ingest::{self, CacheOutcome};
use crate::logging::{self, Stage};
use crate::model::{Table, WqError};
use crate::plot::{self, legend::format_general};

// ============================================================================
// Run Results
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub timestamp: String,
    pub rows: usize,
    pub cache: CacheOutcome,
    pub plots: Vec<PlotSummary>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSummary {
    pub x: String,
    pub y: String,
    pub status: PlotStatus,
    pub output: Option<PathBuf>,
    pub groups: Vec<(String, GroupStats)>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub plots_total: usize,
    pub plots_succeeded: usize,
    pub plots_failed: usize,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Load, clean and cache the sheet named in `config`, then draw every
/// configured plot. Load/clean/cache failures abort; a failing plot is
/// recorded and the rest still run.
pub fn run(config: &AnalysisConfig) -> Result<RunReport, WqError> {
    let table = ingest::load_clean(&config.input, &config.sheet).inspect_err(|e| {
        logging::log_failure(Stage::Ingest, &config.input.display().to_string(), "load", e)
    })?;
    let cache = ingest::write_cache_once(&table, &config.cache_csv)?;
    Ok(run_plots(config, &table, cache))
}

/// Draw every configured plot against an already cleaned table.
pub fn run_plots(config: &AnalysisConfig, table: &Table, cache: CacheOutcome) -> RunReport {
    let mut report = RunReport {
        timestamp: Utc::now().to_rfc3339(),
        rows: table.len(),
        cache,
        plots: Vec::with_capacity(config.plots.len()),
        summary: RunSummary {
            plots_total: config.plots.len(),
            ..RunSummary::default()
        },
    };

    for plot_config in &config.plots {
        let options = plot_config.to_options(&config.output_dir, config.dpi);
        let mut summary = PlotSummary {
            x: plot_config.x.clone(),
            y: plot_config.y.clone(),
            status: PlotStatus::Failed,
            output: options.output.clone(),
            groups: Vec::new(),
            error_message: None,
        };

        match plot::plotter(table, &plot_config.x, &plot_config.y, &options) {
            Ok(plan) => {
                summary.status = PlotStatus::Success;
                summary.groups = plan.stats;
                report.summary.plots_succeeded += 1;
            }
            Err(e) => {
                let subject = format!("{} vs {}", plot_config.x, plot_config.y);
                logging::log_failure(Stage::Plot, &subject, "plot", &e);
                summary.error_message = Some(e.to_string());
                report.summary.plots_failed += 1;
            }
        }
        report.plots.push(summary);
    }

    logging::log_plot_summary(
        report.summary.plots_total,
        report.summary.plots_succeeded,
        report.summary.plots_failed,
    );
    report
}

// ============================================================================
// Console Summary
// ============================================================================

fn stats_line(group: &str, stats: &GroupStats) -> String {
    match stats.correlation() {
        Some(c) => format!(
            "{:<24} n={:<4} r²={:.2}  r={:.2}  p={}",
            group,
            c.n,
            c.r_squared,
            c.r,
            format_general(c.p_value, 2)
        ),
        None => format!("{:<24} insufficient data", group),
    }
}

pub fn print_summary(report: &RunReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 FIELD DATA PLOT SUMMARY  ({})", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    println!("Rows loaded:  {}", report.rows);
    println!("CSV cache:    {}", report.cache);

    for plot in &report.plots {
        println!();
        match plot.status {
            PlotStatus::Success => println!("✓ {} vs {}", plot.x, plot.y),
            PlotStatus::Failed => println!(
                "✗ {} vs {}: {}",
                plot.x,
                plot.y,
                plot.error_message.as_deref().unwrap_or("Unknown")
            ),
        }
        if let (PlotStatus::Success, Some(path)) = (plot.status, &plot.output) {
            println!("    figure: {}", path.display());
        }
        for (group, stats) in &plot.groups {
            println!("    {}", stats_line(group, stats));
        }
    }

    println!();
    println!(
        "Plots: {}/{} succeeded  ({} failed)",
        report.summary.plots_succeeded, report.summary.plots_total, report.summary.plots_failed
    );
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pearson;
    use crate::config::PlotConfig;
    use crate::model::{COL_WATERSHED, CellValue};

    fn table() -> Table {
        let mut table = Table::new(vec![COL_WATERSHED.into(), "pH".into(), "Elevation (m)".into()]);
        for (shed, x, y) in [("A", 1.0, 2.0), ("A", 2.0, 4.0), ("A", 3.0, 6.0), ("B", 5.0, 9.0)] {
            table.push(vec![CellValue::Text(shed.into()), CellValue::Number(x), CellValue::Number(y)]);
        }
        table
    }

    fn in_memory_plot(x: &str, y: &str) -> PlotConfig {
        let mut config = AnalysisConfig::default().plots.remove(0);
        config.x = x.to_string();
        config.y = y.to_string();
        config.output = None;
        config
    }

    #[test]
    fn test_failed_plot_does_not_stop_the_run() {
        let mut config = AnalysisConfig::default();
        config.plots = vec![
            in_memory_plot("Turbidity", "Elevation (m)"),
            in_memory_plot("pH", "Elevation (m)"),
        ];

        let report = run_plots(&config, &table(), CacheOutcome::Skipped);
        assert_eq!(report.summary, RunSummary { plots_total: 2, plots_succeeded: 1, plots_failed: 1 });
        assert_eq!(report.plots[0].status, PlotStatus::Failed);
        assert_eq!(
            report.plots[0].error_message.as_deref(),
            Some("Column not found: Turbidity")
        );
        assert_eq!(report.plots[1].groups.len(), 2);
    }

    #[test]
    fn test_stats_line() {
        assert!(stats_line("B", &pearson(&[(5.0, 9.0)])).ends_with("insufficient data"));
        let line = stats_line("A", &pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]));
        assert!(line.contains("n=3"));
        assert!(line.contains("r²=1.00"));
    }

    #[test]
    fn test_run_reports_missing_workbook() {
        let mut config = AnalysisConfig::default();
        config.input = std::env::temp_dir().join("wq_plots_no_such_book.xlsx");
        let err = run(&config).unwrap_err();
        assert!(matches!(err, WqError::FileNotFound(_)));
    }
}
