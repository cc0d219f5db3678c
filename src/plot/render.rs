/// PNG rendering of a `FigurePlan` with plotters.
///
/// Sizes are specified in points and scaled by `dpi / 72`, so a figure
/// rendered at 600 DPI is the same figure as at 100 DPI, only denser.

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::FontStyle;
use std::error::Error;
use std::path::Path;

use crate::model::WqError;
use crate::plot::layout::{AXES_INCHES, FigurePlan, SeriesPlan, in_view};
use crate::plot::legend::{Legend, LegendMarker};

/// Matplotlib's default categorical cycle.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const FONT_PT: f64 = 10.0;
const MARKER_RADIUS_PT: f64 = 3.0;
const LINE_WIDTH_PT: f64 = 1.5;
const DASH_PT: f64 = 5.5;
const DASH_GAP_PT: f64 = 2.5;
const BAND_ALPHA: f64 = 0.15;

pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Points to pixels at `dpi`, never less than one pixel.
fn px(points: f64, dpi: u32) -> u32 {
    ((points * dpi as f64 / 72.0).round() as u32).max(1)
}

/// Render `plan` to a PNG at `path`.
pub fn render_png(plan: &FigurePlan, path: &Path, dpi: u32) -> Result<(), WqError> {
    let size = plan.pixel_size(dpi);
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_figure(&root, plan, dpi).map_err(|e| WqError::Plot(e.to_string()))
}

fn draw_figure(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    plan: &FigurePlan,
    dpi: u32,
) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;

    let axes_px = (AXES_INCHES * dpi as f64).round() as u32;
    let (axes_area, legend_area) = match plan.legend {
        Some(_) => {
            let (left, right) = root.split_horizontally(axes_px);
            (left, Some(right))
        }
        None => (root.clone(), None),
    };

    let font_px = px(FONT_PT, dpi);
    let (x0, x1) = plan.x_range;
    let (y0, y1) = plan.y_range;

    let mut chart = ChartBuilder::on(&axes_area)
        .margin(px(8.0, dpi))
        .x_label_area_size(px(30.0, dpi))
        .y_label_area_size(px(45.0, dpi))
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(plan.x_label.as_str())
        .y_desc(plan.y_label.as_str())
        .label_style(("sans-serif", font_px))
        .axis_desc_style(("sans-serif", font_px))
        .draw()?;

    for series in &plan.series {
        draw_series(&mut chart, series, plan.x_range, plan.y_range, dpi)?;
    }

    if let Some(text) = &plan.annotation {
        let anchor = (x0 + 0.8 * (x1 - x0), y0 + 0.8 * (y1 - y0));
        let line_px = (font_px as f64 * 1.2).round() as i32;
        for (i, line) in text.lines().enumerate() {
            chart.draw_series(std::iter::once(
                EmptyElement::at(anchor)
                    + Text::new(line.to_string(), (0, i as i32 * line_px), ("sans-serif", font_px as f64).into_font()),
            ))?;
        }
    }

    if let (Some(legend), Some(area)) = (&plan.legend, legend_area.as_ref()) {
        draw_legend(area, legend, dpi)?;
    }

    root.present()?;
    Ok(())
}

fn draw_series(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    series: &SeriesPlan,
    x_range: (f64, f64),
    y_range: (f64, f64),
    dpi: u32,
) -> Result<(), Box<dyn Error>> {
    let color = series_color(series.color_index);
    let visible = |p: &(f64, f64)| in_view(*p, x_range, y_range);

    if let Some(fit) = &series.fit {
        if let Some(band) = &fit.band {
            let band: Vec<_> = band.iter().filter(|b| (x_range.0..=x_range.1).contains(&b.x)).collect();
            if band.len() >= 2 {
                let mut outline: Vec<(f64, f64)> = band.iter().map(|b| (b.x, b.upper)).collect();
                outline.extend(band.iter().rev().map(|b| (b.x, b.lower)));
                chart.draw_series(std::iter::once(Polygon::new(outline, color.mix(BAND_ALPHA).filled())))?;
            }
        }
        chart.draw_series(DashedLineSeries::new(
            fit.line.iter().copied().filter(visible),
            px(DASH_PT, dpi),
            px(DASH_GAP_PT, dpi),
            color.stroke_width(px(LINE_WIDTH_PT, dpi)),
        ))?;
    }

    let radius = px(MARKER_RADIUS_PT, dpi);
    chart.draw_series(
        series
            .points
            .iter()
            .filter(|p| visible(*p))
            .map(|&p| Circle::new(p, radius, color.filled())),
    )?;
    Ok(())
}

/// Legend box outside the axes, anchored at its upper-left corner.
fn draw_legend(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    legend: &Legend,
    dpi: u32,
) -> Result<(), Box<dyn Error>> {
    let font_px = px(FONT_PT, dpi) as i32;
    let line_px = (font_px as f64 * 1.25).round() as i32;
    let pad = px(8.0, dpi) as i32;
    let radius = px(MARKER_RADIUS_PT, dpi) as i32;
    let text_x = pad + radius * 4;

    let title_font = ("sans-serif", font_px as f64).into_font().style(FontStyle::Bold);
    area.draw(&Text::new(legend.title.clone(), (pad, pad), title_font))?;

    let mut y = pad + line_px + line_px / 2;
    for entry in &legend.entries {
        let marker_center = (pad + radius * 2, y + line_px / 2);
        match entry.marker {
            LegendMarker::Series { color_index } => {
                area.draw(&Circle::new(marker_center, radius, series_color(color_index).filled()))?;
            }
            LegendMarker::Generic => {
                area.draw(&Circle::new(marker_center, radius, BLACK.mix(0.6).filled()))?;
            }
        }
        for line in entry.label.lines() {
            area.draw(&Text::new(line.to_string(), (text_x, y), ("sans-serif", font_px as f64).into_font()))?;
            y += line_px;
        }
        y += line_px / 2;
    }
    Ok(())
}
