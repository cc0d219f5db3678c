/// Figure planning: everything a correlation figure shows, computed
/// before any pixels are drawn.
///
/// A `FigurePlan` is the in-memory figure. Rendering only reads it.

use crate::analysis::{BandPoint, GroupStats, Selection, fit_line, group_stats, pearson, select};
use crate::analysis::regression::linspace;
use crate::columns::{PH_AXIS_BOUNDS, axis_bounds_for};
use crate::model::{Table, WqError};
use crate::plot::PlotOptions;
use crate::plot::legend::{Legend, LegendHandle, build_legend, pooled_annotation};

/// Fraction of the data span added on each side of an auto-scaled axis.
const AXIS_MARGIN: f64 = 0.05;

/// Samples along each regression line.
const LINE_SAMPLES: usize = 100;

/// Axes are square, this many inches on a side.
pub const AXES_INCHES: f64 = 5.0;
/// Extra figure width reserved for the outside legend.
pub const LEGEND_INCHES: f64 = 3.0;

/// Label used for the single statistics entry of a pooled plot.
pub const POOLED_GROUP: &str = "all samples";

#[derive(Debug, Clone, PartialEq)]
pub struct FitPlan {
    pub line: Vec<(f64, f64)>,
    pub band: Option<Vec<BandPoint>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPlan {
    /// Group name; `None` for the pooled series.
    pub name: Option<String>,
    pub color_index: usize,
    pub points: Vec<(f64, f64)>,
    pub fit: Option<FitPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigurePlan {
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub series: Vec<SeriesPlan>,
    pub stats: Vec<(String, GroupStats)>,
    pub legend: Option<Legend>,
    /// Pooled-mode text drawn at axes fraction (0.8, 0.8).
    pub annotation: Option<String>,
}

impl FigurePlan {
    /// Figure size in inches: square axes plus room for an outside legend.
    pub fn size_inches(&self) -> (f64, f64) {
        match self.legend {
            Some(_) => (AXES_INCHES + LEGEND_INCHES, AXES_INCHES),
            None => (AXES_INCHES, AXES_INCHES),
        }
    }

    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.size_inches();
        ((w * dpi as f64).round() as u32, (h * dpi as f64).round() as u32)
    }

    /// Number of scatter points drawn for a group.
    pub fn plotted_points(&self, group: &str) -> usize {
        self.series
            .iter()
            .filter(|s| s.name.as_deref() == Some(group))
            .map(|s| s.points.len())
            .sum()
    }

    pub fn stats_for(&self, group: &str) -> Option<&GroupStats> {
        self.stats.iter().find(|(g, _)| g == group).map(|(_, s)| s)
    }
}

/// Compute the full figure for `x` against `y`.
pub fn plan_figure(table: &Table, x: &str, y: &str, options: &PlotOptions) -> Result<FigurePlan, WqError> {
    let group_column = options.per_group.then_some(options.group_by.as_str());
    let mut selection: Selection = select(table, x, y, group_column)?;
    if let Some(focus) = options.focus.as_deref() {
        selection = selection.focus(focus);
    }

    let (series, stats, annotation) = if options.per_group {
        let groups = selection.groups();
        let stats = group_stats(&groups);
        let series: Vec<SeriesPlan> = groups
            .into_iter()
            .enumerate()
            .map(|(i, g)| series_plan(Some(g.name), i, g.points, options.ci))
            .collect();
        (series, stats, None)
    } else {
        let points = selection.xy();
        let pooled = pearson(&points);
        let annotation = pooled_annotation(&pooled);
        let series = vec![series_plan(None, 0, points, options.ci)];
        (series, vec![(POOLED_GROUP.to_string(), pooled)], Some(annotation))
    };

    // `ph_axis` pins x to the registered range of the column, or to the
    // pH range when the column has none.
    let x_range = if options.ph_axis {
        axis_bounds_for(x).unwrap_or(PH_AXIS_BOUNDS)
    } else {
        padded_range(series.iter().flat_map(x_extent))
    };
    let y_range = padded_range(series.iter().flat_map(y_extent));

    // Only series with a marker inside the axes leave a handle behind.
    let legend = if options.per_group {
        let handles: Vec<LegendHandle> = series
            .iter()
            .filter(|s| s.points.iter().any(|&p| in_view(p, x_range, y_range)))
            .filter_map(|s| {
                s.name.as_ref().map(|name| LegendHandle {
                    group: name.clone(),
                    color_index: s.color_index,
                })
            })
            .collect();
        build_legend(&stats, &handles)
    } else {
        None
    };

    Ok(FigurePlan {
        x_label: x.to_string(),
        y_label: y.to_string(),
        x_range,
        y_range,
        series,
        stats,
        legend,
        annotation,
    })
}

fn series_plan(name: Option<String>, color_index: usize, points: Vec<(f64, f64)>, ci: Option<f64>) -> SeriesPlan {
    let fit = fit_line(&points).map(|fit| {
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
        let xs = linspace(lo, hi, LINE_SAMPLES);
        FitPlan {
            line: xs.iter().map(|&x| (x, fit.predict(x))).collect(),
            band: ci.and_then(|level| fit.confidence_band(&xs, level)),
        }
    });
    SeriesPlan {
        name,
        color_index,
        points,
        fit,
    }
}

/// Whether a point falls inside the axes.
pub fn in_view(point: (f64, f64), x_range: (f64, f64), y_range: (f64, f64)) -> bool {
    (x_range.0..=x_range.1).contains(&point.0) && (y_range.0..=y_range.1).contains(&point.1)
}

fn x_extent(series: &SeriesPlan) -> Vec<f64> {
    series.points.iter().map(|p| p.0).collect()
}

fn y_extent(series: &SeriesPlan) -> Vec<f64> {
    let mut ys: Vec<f64> = series.points.iter().map(|p| p.1).collect();
    if let Some(fit) = &series.fit {
        ys.extend(fit.line.iter().map(|p| p.1));
        if let Some(band) = &fit.band {
            ys.extend(band.iter().flat_map(|b| [b.lower, b.upper]));
        }
    }
    ys
}

/// Data range padded by `AXIS_MARGIN`; a flat or empty range opens up
/// around its value.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span <= 0.0 {
        let pad = if lo == 0.0 { 0.5 } else { lo.abs() * AXIS_MARGIN };
        return (lo - pad, hi + pad);
    }
    (lo - span * AXIS_MARGIN, hi + span * AXIS_MARGIN)
}
