//! Terminal preview: a `Renderer` whose output is a prepared chart frame,
//! and the widget that draws it.

use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset as ChartDataset, GraphType, LegendPosition, Paragraph, Widget},
};
use tracing::trace;

use crate::chart_data::{format_axis_label, format_x_axis_label, prepare_chart_frame, ChartFrame, XAxisKind};
use crate::config::Theme;
use crate::dataset::Dataset;
use crate::preview::{LayerKind, PlotSpec, Renderer};

/// Renders into an in-memory frame that the chart widget draws each tick.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    live: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered and not yet released.
    pub fn live(&self) -> usize {
        self.live
    }
}

impl Renderer for TerminalRenderer {
    type Handle = ChartFrame;

    fn render(&mut self, spec: &PlotSpec, dataset: &Dataset) -> Result<ChartFrame> {
        let frame = prepare_chart_frame(spec, dataset);
        self.live += 1;
        trace!(series = frame.series.len(), "terminal frame rendered");
        Ok(frame)
    }

    fn release(&mut self, _handle: ChartFrame) {
        self.live = self.live.saturating_sub(1);
    }
}

/// Chart area plus one line for the probed point's tooltip.
pub fn render_chart_view(
    area: Rect,
    buf: &mut ratatui::buffer::Buffer,
    frame: Option<&ChartFrame>,
    probe: Option<usize>,
    theme: &Theme,
) {
    let text_primary = theme.get("text_primary");
    let text_secondary = theme.get("text_secondary");

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(area);

    let frame = match frame {
        Some(f) if f.has_data() => f,
        _ => {
            Paragraph::new("Nothing to plot. Add a mark with X and Y columns (a)")
                .style(Style::default().fg(text_secondary))
                .centered()
                .render(layout[0], buf);
            return;
        }
    };

    let tips = frame.tip_points();
    let probed = probe.and_then(|i| tips.get(i % tips.len().max(1)));
    let probe_point: Vec<(f64, f64)> = probed.map(|(p, _)| vec![*p]).unwrap_or_default();

    let mut datasets: Vec<ChartDataset> = frame
        .series
        .iter()
        .filter(|s| !s.hidden && !s.points.is_empty())
        .map(|s| {
            let (graph_type, marker) = match s.kind {
                LayerKind::Line => (GraphType::Line, symbols::Marker::Braille),
                LayerKind::Dot => (GraphType::Scatter, symbols::Marker::Dot),
                LayerKind::Bar => (GraphType::Bar, symbols::Marker::HalfBlock),
            };
            let mut ds = ChartDataset::default()
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(theme.series_color(s.color_index)))
                .data(&s.points);
            // Points drawn under a line share its legend entry.
            if s.kind != LayerKind::Dot || !frame.series.iter().any(|o| o.kind == LayerKind::Line && o.name == s.name) {
                ds = ds.name(s.name.clone());
            }
            ds
        })
        .collect();

    if !probe_point.is_empty() {
        datasets.push(
            ChartDataset::default()
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.get("modal_border_active")))
                .data(&probe_point),
        );
    }

    let [x_min, x_max] = frame.x_bounds;
    let [y_min, y_max] = frame.y_bounds;
    let axis_label_style = Style::default().fg(text_primary);

    let x_labels: Vec<Span> = match &frame.x_axis_kind {
        XAxisKind::Categorical(names) if names.len() <= 8 => names
            .iter()
            .map(|n| Span::styled(n.clone(), axis_label_style))
            .collect(),
        kind => [x_min, (x_min + x_max) / 2.0, x_max]
            .iter()
            .map(|&v| Span::styled(format_x_axis_label(v, kind), axis_label_style))
            .collect(),
    };
    let y_labels: Vec<Span> = [y_min, (y_min + y_max) / 2.0, y_max]
        .iter()
        .map(|&v| Span::styled(format_axis_label(v), axis_label_style))
        .collect();

    let x_axis = Axis::default()
        .title(frame.x_label.as_str())
        .bounds([x_min, x_max])
        .style(Style::default().fg(theme.get("dimmed")))
        .labels(x_labels);
    let y_axis = Axis::default()
        .title(frame.y_label.as_str())
        .bounds([y_min, y_max])
        .style(Style::default().fg(theme.get("dimmed")))
        .labels(y_labels);

    let legend = if frame.legend {
        Some(LegendPosition::TopRight)
    } else {
        None
    };
    Chart::new(datasets)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(legend)
        .render(layout[0], buf);

    let tip_line = match probed {
        Some(((x, y), text)) => Line::from(vec![
            Span::styled(
                format!(
                    "{}, {}  ",
                    format_x_axis_label(*x, &frame.x_axis_kind),
                    format_axis_label(*y)
                ),
                Style::default().fg(theme.get("modal_border_active")),
            ),
            Span::styled(*text, Style::default().fg(text_primary)),
        ]),
        None if !tips.is_empty() => Line::from(Span::styled(
            "[ ] probe points",
            Style::default().fg(text_secondary),
        )),
        None => Line::default(),
    };
    Paragraph::new(tip_line).render(layout[1], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabelTable;
    use crate::mark::Mark;
    use crate::preview::{build_spec, Preview, PreviewOptions};
    use serde_json::json;

    fn dataset() -> Dataset {
        let rows: Vec<_> = json!([{"x": 1, "y": 2}, {"x": 2, "y": 5}])
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect();
        Dataset::from_json_rows(&rows, &LabelTable::default()).unwrap()
    }

    #[test]
    fn one_frame_live_per_preview() {
        let ds = dataset();
        let mut preview = Preview::new(TerminalRenderer::new());
        let marks = [Mark::dot(Some("x".into()), Some("y".into()))];
        for _ in 0..3 {
            preview
                .refresh(build_spec(&marks, &ds, &PreviewOptions::default()), &ds)
                .unwrap();
            assert_eq!(preview.renderer().live(), 1);
        }
        assert!(preview.handle().is_some_and(ChartFrame::has_data));
    }

    #[test]
    fn renders_into_buffer() {
        let ds = dataset();
        let mut renderer = TerminalRenderer::new();
        let spec = build_spec(
            &[Mark::dot(Some("x".into()), Some("y".into()))],
            &ds,
            &PreviewOptions::default(),
        );
        let frame = renderer.render(&spec, &ds).unwrap();
        let theme = Theme::from_config(&Default::default()).unwrap();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = ratatui::buffer::Buffer::empty(area);
        render_chart_view(area, &mut buf, Some(&frame), None, &theme);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains('y'));
    }

    #[test]
    fn empty_frame_shows_hint() {
        let theme = Theme::from_config(&Default::default()).unwrap();
        let area = Rect::new(0, 0, 60, 5);
        let mut buf = ratatui::buffer::Buffer::empty(area);
        render_chart_view(area, &mut buf, None, None, &theme);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Nothing to plot"));
    }
}
