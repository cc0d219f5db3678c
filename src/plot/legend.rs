/// Legend and annotation text for correlation figures.

use crate::analysis::GroupStats;

pub const LEGEND_TITLE: &str = "Watershed";

/// What the legend swatch looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum LegendMarker {
    /// Same color as the group's scatter series.
    Series { color_index: usize },
    /// Neutral marker used when the drawing produced no handle of its own.
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub marker: LegendMarker,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// A series drawn on the axes that can carry a legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendHandle {
    pub group: String,
    pub color_index: usize,
}

/// Format like a `{:.Ng}` general-format conversion: `precision`
/// significant digits, exponent form below 1e-4 or at/above 10^precision,
/// trailing zeros dropped.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_trailing_zeros(&mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value))
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Legend text for one group.
pub fn group_label(name: &str, stats: Option<&GroupStats>) -> String {
    match stats.and_then(|s| s.correlation()) {
        Some(c) => format!(
            "{}\n    r²={:.2}\n    r={:.2}\n    p={}",
            name,
            c.r_squared,
            c.r,
            format_general(c.p_value, 2)
        ),
        None => format!("{} (insufficient data)", name),
    }
}

/// On-axes text for pooled plots.
pub fn pooled_annotation(stats: &GroupStats) -> String {
    match stats.correlation() {
        Some(c) => format!(
            "r²={:.4}\nr={:.2}\np={}",
            c.r_squared,
            c.r,
            format_general(c.p_value, 2)
        ),
        None => "insufficient data".to_string(),
    }
}

/// Build the grouped-mode legend from the handles the drawing produced.
///
/// With no handles and exactly one group, a generic marker carries that
/// group's label. With no handles otherwise, there is no legend.
pub fn build_legend(stats: &[(String, GroupStats)], handles: &[LegendHandle]) -> Option<Legend> {
    let lookup = |name: &str| stats.iter().find(|(g, _)| g == name).map(|(_, s)| s);

    let entries: Vec<LegendEntry> = if handles.is_empty() {
        match stats {
            [(name, s)] => vec![LegendEntry {
                label: group_label(name, Some(s)),
                marker: LegendMarker::Generic,
            }],
            _ => return None,
        }
    } else {
        handles
            .iter()
            .map(|h| LegendEntry {
                label: group_label(&h.group, lookup(&h.group)),
                marker: LegendMarker::Series {
                    color_index: h.color_index,
                },
            })
            .collect()
    };

    Some(Legend {
        title: LEGEND_TITLE.to_string(),
        entries,
    })
}
