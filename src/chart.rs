use serde::{Deserialize, Serialize};

use crate::data::model::{ChartKind, Dataset};
use crate::data::sanitize::DiagnosticSink;

// ---------------------------------------------------------------------------
// ChartSpec – the renderer-facing chart description
// ---------------------------------------------------------------------------

/// Everything a renderer needs to draw one chart. This is the seam handed
/// to whatever presentation layer sits downstream; nothing here knows how
/// the chart will actually be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub table: String,
    pub kind: ChartKind,
    pub x_title: String,
    pub y_title: String,
    /// Display points, X-sorted and thinned to the kind's point budget.
    pub points: Vec<[f64; 2]>,
    /// Statistics over the full sanitized dataset, before thinning.
    pub info: ChartInfo,
}

/// Per-chart statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartInfo {
    pub data_points: usize,
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    pub x_mean: f64,
    pub y_mean: f64,
}

impl ChartInfo {
    fn from_points(points: &[[f64; 2]]) -> Self {
        let n = points.len() as f64;
        let mut x_range = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y_range = [f64::INFINITY, f64::NEG_INFINITY];
        let (mut x_sum, mut y_sum) = (0.0, 0.0);
        for &[x, y] in points {
            x_range = [x_range[0].min(x), x_range[1].max(x)];
            y_range = [y_range[0].min(y), y_range[1].max(y)];
            x_sum += x;
            y_sum += y;
        }
        ChartInfo {
            data_points: points.len(),
            x_range,
            y_range,
            x_mean: x_sum / n,
            y_mean: y_sum / n,
        }
    }
}

/// Axis titles for a chart kind.
fn axis_titles(kind: ChartKind) -> (&'static str, &'static str) {
    match kind {
        ChartKind::Waveform => ("Time (s)", "Amplitude"),
        ChartKind::SpectrumHz => ("Frequency (Hz)", "Magnitude"),
        ChartKind::SpectrumOrder => ("Order", "Magnitude"),
        ChartKind::Generic => ("Value X", "Value Y"),
    }
}

/// Display-point budget per kind. Bar-style spectra get far fewer points
/// than line charts.
fn point_budget(kind: ChartKind) -> usize {
    match kind {
        ChartKind::Waveform => 5000,
        ChartKind::SpectrumHz | ChartKind::SpectrumOrder => 1000,
        ChartKind::Generic => 2000,
    }
}

// ---------------------------------------------------------------------------
// Chart construction
// ---------------------------------------------------------------------------

/// Build the chart description for one sanitized table, or `None` (with a
/// diagnostic) when the data is not worth a chart.
pub fn build_chart(
    ds: &Dataset,
    table_name: &str,
    kind: ChartKind,
    sink: &mut dyn DiagnosticSink,
) -> Option<ChartSpec> {
    let mut points: Vec<[f64; 2]> = ds.xy_points().into_iter().map(|(x, y)| [x, y]).collect();
    points.retain(|p| p[0].is_finite() && p[1].is_finite());

    if points.is_empty() {
        sink.warn(&format!("table {table_name}: no plottable data"));
        return None;
    }
    if points.len() < 2 {
        sink.warn(&format!(
            "table {table_name}: insufficient data points ({})",
            points.len()
        ));
        return None;
    }

    let info = ChartInfo::from_points(&points);
    if info.x_range[1] - info.x_range[0] == 0.0 && info.y_range[1] - info.y_range[0] == 0.0 {
        sink.warn(&format!("table {table_name}: constant data, nothing to plot"));
        return None;
    }

    let full = points.len();
    let points = apply_point_budget(points, point_budget(kind));
    if points.len() < full {
        sink.info(&format!(
            "table {table_name}: thinned {full} points to {} for display",
            points.len()
        ));
    }

    let (x_title, y_title) = axis_titles(kind);
    Some(ChartSpec {
        table: table_name.to_string(),
        kind,
        x_title: x_title.to_string(),
        y_title: y_title.to_string(),
        points,
        info,
    })
}

/// Systematic thinning: X-sort, keep every k-th point so the count lands
/// near the budget, and always retain the last point.
fn apply_point_budget(mut points: Vec<[f64; 2]>, budget: usize) -> Vec<[f64; 2]> {
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    if points.len() <= budget {
        return points;
    }
    let step = (points.len() / budget).max(1);
    let mut thinned: Vec<[f64; 2]> = points.iter().copied().step_by(step).collect();
    if let Some(&last) = points.last() {
        if thinned.last() != Some(&last) {
            thinned.push(last);
        }
    }
    thinned
}
