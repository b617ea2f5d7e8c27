//! Prepare chart data from a plot spec: resolve channels against the rows,
//! group by colour and convert to (f64, f64) points.

use crate::dataset::{Dataset, Row, Value};
use crate::preview::{Layer, LayerKind, PlotSpec};

/// How x-axis numeric values map back to labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XAxisKind {
    Numeric,
    /// x = milliseconds since epoch
    DatetimeMs,
    /// x = index into the category list
    Categorical(Vec<String>),
}

/// One coloured series of a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub kind: LayerKind,
    /// Index of the series' colour in the palette, shared by layers with the same group.
    pub color_index: usize,
    pub hidden: bool,
    pub points: Vec<(f64, f64)>,
    /// Tooltip text per point, empty when the layer has no tooltip channels.
    pub tips: Vec<String>,
}

/// Renderer-agnostic chart: series plus bounds and axis labelling.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartFrame {
    pub series: Vec<ChartSeries>,
    pub x_axis_kind: XAxisKind,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: String,
    pub y_label: String,
    pub legend: bool,
    pub width: u32,
    pub height: u32,
}

impl ChartFrame {
    pub fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.points.is_empty())
    }

    /// Distinct (name, colour) pairs in first-seen order.
    pub fn legend_entries(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = Vec::new();
        for s in &self.series {
            if !out.iter().any(|(n, _)| *n == s.name) {
                out.push((s.name.as_str(), s.color_index));
            }
        }
        out
    }

    /// Points with tooltip text, in series order.
    pub fn tip_points(&self) -> Vec<((f64, f64), &str)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied().zip(s.tips.iter().map(String::as_str)))
            .collect()
    }
}

/// Assigns positions to text x values in first-seen order.
#[derive(Default)]
struct Categories(Vec<String>);

impl Categories {
    fn position(&mut self, v: &Value) -> Option<f64> {
        match v {
            Value::Text(s) => {
                let idx = match self.0.iter().position(|c| c == s) {
                    Some(i) => i,
                    None => {
                        self.0.push(s.clone());
                        self.0.len() - 1
                    }
                };
                Some(idx as f64)
            }
            other => other.as_f64(),
        }
    }
}

fn series_key(row: &Row, color: Option<&str>, dataset: &Dataset) -> Option<String> {
    let col = color.filter(|c| dataset.column(c).is_some())?;
    Some(row.get(col).display())
}

fn tip_text(row: &Row, layer: &Layer) -> String {
    layer
        .tooltip
        .iter()
        .map(|(label, col)| format!("{}: {}", label, row.get(col).display()))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Resolve every layer of `spec` against `dataset`. Rows without a
/// position on either axis are dropped.
pub fn prepare_chart_frame(spec: &PlotSpec, dataset: &Dataset) -> ChartFrame {
    let mut categories = Categories::default();
    let mut groups: Vec<String> = Vec::new();
    let mut has_dates = false;
    let mut series: Vec<ChartSeries> = Vec::new();

    for layer in &spec.layers {
        let (Some(x), Some(y)) = (layer.x.as_deref(), layer.y.as_deref()) else {
            continue;
        };
        let mut rows: Vec<&Row> = dataset.rows.iter().collect();
        if layer.sort_by_x {
            rows.sort_by(|a, b| {
                let (ax, bx) = (a.get(x).as_f64(), b.get(x).as_f64());
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let first_index = series.len();
        for row in rows {
            let xv = row.get(x);
            has_dates |= matches!(xv, Value::Date(_));
            let (Some(px), Some(py)) = (categories.position(xv), row.get(y).as_f64()) else {
                continue;
            };
            if !px.is_finite() {
                continue;
            }
            let name = series_key(row, layer.color.as_deref(), dataset)
                .unwrap_or_else(|| spec.y_label.clone().unwrap_or_else(|| y.to_string()));
            let color_index = match groups.iter().position(|g| *g == name) {
                Some(i) => i,
                None => {
                    groups.push(name.clone());
                    groups.len() - 1
                }
            };
            let idx = match series[first_index..].iter().position(|s| s.name == name) {
                Some(i) => first_index + i,
                None => {
                    series.push(ChartSeries {
                        name,
                        kind: layer.kind,
                        color_index,
                        hidden: layer.is_hidden(),
                        points: Vec::new(),
                        tips: Vec::new(),
                    });
                    series.len() - 1
                }
            };
            series[idx].points.push((px, py));
            if !layer.tooltip.is_empty() {
                series[idx].tips.push(tip_text(row, layer));
            }
        }
    }

    let x_axis_kind = if !categories.0.is_empty() {
        XAxisKind::Categorical(categories.0)
    } else if has_dates {
        XAxisKind::DatetimeMs
    } else {
        XAxisKind::Numeric
    };
    let (x_bounds, y_bounds) = bounds(&series, &x_axis_kind, spec.y_domain);

    ChartFrame {
        series,
        x_axis_kind,
        x_bounds,
        y_bounds,
        x_label: spec.x_label.clone().unwrap_or_default(),
        y_label: spec.y_label.clone().unwrap_or_default(),
        legend: spec.legend,
        width: spec.width,
        height: spec.height,
    }
}

fn bounds(
    series: &[ChartSeries],
    x_axis_kind: &XAxisKind,
    y_domain: Option<(f64, f64)>,
) -> ([f64; 2], [f64; 2]) {
    let points = series.iter().flat_map(|s| s.points.iter());
    let (mut x_min, mut x_max, mut y_min, mut y_max) =
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if x_min > x_max {
        return ([0.0, 1.0], [0.0, 1.0]);
    }
    if let Some((lo, hi)) = y_domain {
        y_min = lo;
        y_max = hi;
    }
    // Bars draw from 0.
    if series.iter().any(|s| s.kind == LayerKind::Bar) {
        y_min = y_min.min(0.0);
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let x = match x_axis_kind {
        XAxisKind::Categorical(_) => [x_min - 0.5, x_max + 0.5],
        _ if x_max > x_min => [x_min, x_max],
        _ => [x_min - 0.5, x_min + 0.5],
    };
    (x, [y_min, y_max])
}

pub fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Format x-axis label: dates when kind is temporal, category names when
/// categorical, else numeric.
pub fn format_x_axis_label(v: f64, kind: &XAxisKind) -> String {
    use chrono::{DateTime, Utc};

    match kind {
        XAxisKind::Numeric => format_axis_label(v),
        XAxisKind::DatetimeMs => DateTime::from_timestamp_millis(v.trunc() as i64)
            .map(|dt: DateTime<Utc>| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| format_axis_label(v)),
        XAxisKind::Categorical(names) => {
            let idx = v.round();
            if (v - idx).abs() < 0.25 && idx >= 0.0 {
                names.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        }
    }
}
