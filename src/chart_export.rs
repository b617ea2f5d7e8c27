//! Chart export to PNG (plotters bitmap).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chart_data::{format_axis_label, format_x_axis_label, prepare_chart_frame, ChartFrame, XAxisKind};
use crate::dataset::Dataset;
use crate::preview::{LayerKind, PlotSpec, Renderer};

/// Renders each preview to the same PNG file; the file is the output, so
/// releasing a handle leaves it in place.
pub struct PngRenderer {
    path: PathBuf,
}

impl PngRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Renderer for PngRenderer {
    type Handle = PathBuf;

    fn render(&mut self, spec: &PlotSpec, dataset: &Dataset) -> Result<PathBuf> {
        let frame = prepare_chart_frame(spec, dataset);
        write_chart_png(&self.path, &frame)?;
        info!(path = %self.path.display(), width = frame.width, height = frame.height, "exported chart");
        Ok(self.path.clone())
    }

    fn release(&mut self, _handle: PathBuf) {}
}

/// Write chart to PNG using plotters bitmap backend.
pub fn write_chart_png(path: &Path, frame: &ChartFrame) -> Result<()> {
    use plotters::prelude::*;

    if !frame.has_data() {
        return Err(eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, (frame.width.max(64), frame.height.max(64))).into_drawing_area();
    root.fill(&WHITE)?;

    let [x_min, x_max] = frame.x_bounds;
    let [y_min, y_max] = frame.y_bounds;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let x_kind = &frame.x_axis_kind;
    let format_x = |v: &f64| format_x_axis_label(*v, x_kind);
    let format_y = |v: &f64| format_axis_label(*v);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(frame.x_label.as_str())
        .y_desc(frame.y_label.as_str())
        .x_label_formatter(&format_x)
        .y_label_formatter(&format_y);
    if let XAxisKind::Categorical(names) = x_kind {
        mesh.x_labels(names.len() * 2 + 1);
    }
    mesh.draw()?;

    let colors = [
        RGBColor(66, 105, 208),
        RGBColor(239, 177, 24),
        RGBColor(255, 114, 92),
        RGBColor(108, 197, 176),
        RGBColor(60, 160, 70),
        RGBColor(255, 138, 183),
        RGBColor(166, 153, 232),
        RGBColor(151, 187, 245),
        RGBColor(156, 107, 78),
        RGBColor(148, 152, 160),
    ];

    let bar_half = match x_kind {
        XAxisKind::Categorical(_) => 0.3,
        _ => ((x_max - x_min) * 0.01).max(f64::EPSILON),
    };
    let mut labelled: Vec<&str> = Vec::new();

    for s in &frame.series {
        if s.points.is_empty() || s.hidden {
            continue;
        }
        let color = colors[s.color_index % colors.len()];
        let annotation = match s.kind {
            LayerKind::Line => chart.draw_series(LineSeries::new(s.points.iter().copied(), color))?,
            LayerKind::Dot => chart.draw_series(PointSeries::of_element(
                s.points.iter().copied(),
                3,
                color,
                &|c, r, st| EmptyElement::at(c) + Circle::new((0, 0), r, st.filled()),
            ))?,
            LayerKind::Bar => chart.draw_series(s.points.iter().map(|&(x, y)| {
                Rectangle::new([(x - bar_half, 0.0), (x + bar_half, y)], color.filled())
            }))?,
        };
        if frame.legend && !labelled.contains(&s.name.as_str()) {
            labelled.push(s.name.as_str());
            annotation
                .label(s.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled()));
        }
    }

    if frame.legend && !labelled.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
