/// Correlation figures.
///
/// Submodules:
/// - `layout` — computes the in-memory figure (`FigurePlan`).
/// - `legend` — legend labels, annotation text, `.2g` formatting.
/// - `render` — draws a plan to PNG with plotters.

pub mod layout;
pub mod legend;
pub mod render;

pub use layout::{FigurePlan, FitPlan, SeriesPlan, plan_figure};
pub use legend::{Legend, LegendEntry, LegendMarker};

use std::path::PathBuf;

use crate::logging::{self, Stage};
use crate::model::{COL_WATERSHED, Table, WqError};

pub const DEFAULT_DPI: u32 = 600;

/// Options for one figure.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    /// Keep only rows of this watershed.
    pub focus: Option<String>,
    /// Categorical column that splits the scatter into groups.
    pub group_by: String,
    /// One regression per group (`true`) or one pooled regression.
    pub per_group: bool,
    /// Confidence band level in percent; `None` draws no band.
    pub ci: Option<f64>,
    /// Fix the x axis to the pH display range.
    pub ph_axis: bool,
    /// PNG destination; `None` keeps the figure in memory only.
    pub output: Option<PathBuf>,
    pub dpi: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            focus: None,
            group_by: COL_WATERSHED.to_string(),
            per_group: true,
            ci: Some(95.0),
            ph_axis: false,
            output: None,
            dpi: DEFAULT_DPI,
        }
    }
}

/// Plot `y` against `x`, grouped or pooled, and write the PNG when an
/// output path is set. Returns the figure either way.
pub fn plotter(table: &Table, x: &str, y: &str, options: &PlotOptions) -> Result<FigurePlan, WqError> {
    let subject = format!("{} vs {}", x, y);
    let plan = plan_figure(table, x, y, options)?;

    for (group, stats) in &plan.stats {
        let message = match stats.correlation() {
            Some(c) => format!("{}: n={} r={:.3} r²={:.3} p={:.3e}", group, c.n, c.r, c.r_squared, c.p_value),
            None => format!("{}: insufficient data", group),
        };
        logging::debug(Stage::Stats, Some(&subject), &message);
    }

    if let Some(path) = &options.output {
        render::render_png(&plan, path, options.dpi)?;
        logging::info(Stage::Plot, Some(&subject), &format!("Saved {}", path.display()));
    }

    Ok(plan)
}
