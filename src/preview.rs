//! Mark list -> plot description, and the live preview that owns the
//! rendered output.

use crate::dataset::{Dataset, LabelTable, Row};
use crate::mark::Mark;
use color_eyre::Result;
use tracing::{debug, trace};

/// Primitive a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Dot,
    Bar,
    Line,
}

/// One drawable layer. Column-valued channels hold column ids; a colour
/// channel naming no column puts every row in one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    /// Point radius override; `Some(0.0)` hides the points.
    pub r: Option<f64>,
    pub tip: bool,
    /// Tooltip rows as (label, column id).
    pub tooltip: Vec<(String, String)>,
    /// Draw rows in ascending X order.
    pub sort_by_x: bool,
}

impl Layer {
    fn new(kind: LayerKind, x: Option<&str>, y: Option<&str>, color: Option<&str>) -> Self {
        Self {
            kind,
            x: x.map(str::to_string),
            y: y.map(str::to_string),
            color: color.map(str::to_string),
            r: None,
            tip: false,
            tooltip: Vec::new(),
            sort_by_x: false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.r == Some(0.0)
    }
}

/// Everything a renderer needs besides the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub width: u32,
    pub height: u32,
    pub legend: bool,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub y_domain: Option<(f64, f64)>,
    pub layers: Vec<Layer>,
}

/// Plot-wide settings that do not come from the marks.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub width: u32,
    pub height: u32,
    pub legend: bool,
    pub tooltip: Vec<(String, String)>,
    pub labels: LabelTable,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            legend: true,
            tooltip: Vec::new(),
            labels: LabelTable::default(),
        }
    }
}

/// Shared Y domain `[min(0, lo), hi]` over every mark's Y column and every
/// row. Non-numeric cells are skipped; `None` when nothing is numeric.
pub fn y_domain(marks: &[Mark], rows: &[Row]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for y in marks.iter().filter_map(Mark::y) {
        for v in rows.iter().filter_map(|r| r.get(y).as_f64()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo > hi {
        return None;
    }
    Some((lo.min(0.0), hi))
}

/// Translate the mark list into layers. Line marks also emit a point layer
/// on the same X/Y, coloured by the line's stroke.
pub fn build_spec(marks: &[Mark], dataset: &Dataset, options: &PreviewOptions) -> PlotSpec {
    let tooltip: Vec<(String, String)> = options
        .tooltip
        .iter()
        .filter(|(_, col)| dataset.column(col).is_some())
        .cloned()
        .collect();

    let mut layers = Vec::new();
    for mark in marks {
        match mark {
            Mark::Dot(o) => {
                let mut dot = Layer::new(LayerKind::Dot, o.x.as_deref(), o.y.as_deref(), o.fill.as_deref());
                dot.tip = o.tip.unwrap_or(false);
                dot.tooltip = tooltip.clone();
                layers.push(dot);
            }
            Mark::BarY(o) => {
                let mut bar = Layer::new(LayerKind::Bar, o.x.as_deref(), o.y.as_deref(), o.fill.as_deref());
                bar.tip = o.tip.unwrap_or(false);
                layers.push(bar);
            }
            Mark::LineY(o) => {
                let mut line = Layer::new(LayerKind::Line, o.x.as_deref(), o.y.as_deref(), o.stroke.as_deref());
                line.sort_by_x = true;
                line.tip = o.tip.unwrap_or(false);
                layers.push(line);

                let mut dot = Layer::new(LayerKind::Dot, o.x.as_deref(), o.y.as_deref(), o.stroke.as_deref());
                if o.hide_points.unwrap_or(false) {
                    dot.r = Some(0.0);
                }
                dot.tooltip = tooltip.clone();
                layers.push(dot);
            }
        }
    }

    let first = marks.first();
    let label = |id: Option<&str>| id.map(|id| options.labels.label(id).to_string());
    PlotSpec {
        width: options.width,
        height: options.height,
        legend: options.legend,
        x_label: label(first.and_then(Mark::x)),
        y_label: label(first.and_then(Mark::y)),
        y_domain: y_domain(marks, &dataset.rows),
        layers,
    }
}

/// Plot engine. Each render yields a handle that must be released before
/// the next one is shown.
pub trait Renderer {
    type Handle;

    fn render(&mut self, spec: &PlotSpec, dataset: &Dataset) -> Result<Self::Handle>;

    fn release(&mut self, handle: Self::Handle);
}

/// Live preview: holds at most one rendered handle at a time.
pub struct Preview<R: Renderer> {
    renderer: R,
    handle: Option<R::Handle>,
    spec: Option<PlotSpec>,
}

impl<R: Renderer> Preview<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            handle: None,
            spec: None,
        }
    }

    /// Release the current output, then render `spec`. On failure the
    /// preview is left empty.
    pub fn refresh(&mut self, spec: PlotSpec, dataset: &Dataset) -> Result<()> {
        if let Some(old) = self.handle.take() {
            trace!("releasing previous preview");
            self.renderer.release(old);
        }
        self.spec = None;
        debug!(layers = spec.layers.len(), "rendering preview");
        let handle = self.renderer.render(&spec, dataset)?;
        self.handle = Some(handle);
        self.spec = Some(spec);
        Ok(())
    }

    pub fn handle(&self) -> Option<&R::Handle> {
        self.handle.as_ref()
    }

    pub fn spec(&self) -> Option<&PlotSpec> {
        self.spec.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<R: Renderer> Drop for Preview<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.renderer.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::{BarYOptions, LineYOptions};
    use color_eyre::eyre::eyre;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn dataset(v: serde_json::Value) -> Dataset {
        let rows: Vec<_> = v
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect();
        Dataset::from_json_rows(&rows, &LabelTable::default()).unwrap()
    }

    #[test]
    fn y_domain_spans_all_marks_and_includes_zero() {
        let ds = dataset(json!([
            {"x": 1, "a": 0, "b": 5},
            {"x": 2, "a": 10, "b": 20}
        ]));
        let marks = vec![
            Mark::dot(Some("x".into()), Some("a".into())),
            Mark::dot(Some("x".into()), Some("b".into())),
        ];
        assert_eq!(y_domain(&marks, &ds.rows), Some((0.0, 20.0)));
    }

    #[test]
    fn y_domain_keeps_negative_minimum_and_skips_text() {
        let ds = dataset(json!([{"y": -3}, {"y": "n/a"}, {"y": 7}]));
        let marks = vec![Mark::dot(None, Some("y".into()))];
        assert_eq!(y_domain(&marks, &ds.rows), Some((-3.0, 7.0)));
        assert_eq!(y_domain(&[Mark::dot(None, None)], &ds.rows), None);
    }

    #[test]
    fn line_emits_companion_dot() {
        let ds = dataset(json!([{"x": 2, "y": 1}, {"x": 1, "y": 3}]));
        let marks = vec![Mark::LineY(LineYOptions {
            x: Some("x".into()),
            y: Some("y".into()),
            stroke: Some("group_id".into()),
            tip: Some(false),
            hide_points: Some(true),
        })];
        let spec = build_spec(&marks, &ds, &PreviewOptions::default());
        assert_eq!(spec.layers.len(), 2);
        assert_eq!(spec.layers[0].kind, LayerKind::Line);
        assert!(spec.layers[0].sort_by_x);
        assert_eq!(spec.layers[1].kind, LayerKind::Dot);
        assert_eq!(spec.layers[1].r, Some(0.0));
        assert!(spec.layers[1].is_hidden());
        assert_eq!(spec.layers[1].color.as_deref(), Some("group_id"));
    }

    #[test]
    fn tooltips_only_name_existing_columns() {
        let ds = dataset(json!([{"x": 1, "y": 2, "gpu": "H100"}]));
        let options = PreviewOptions {
            tooltip: vec![
                ("GPU".into(), "gpu".into()),
                ("Region".into(), "region".into()),
            ],
            ..Default::default()
        };
        let marks = vec![
            Mark::dot(Some("x".into()), Some("y".into())),
            Mark::BarY(BarYOptions::default()),
        ];
        let spec = build_spec(&marks, &ds, &options);
        assert_eq!(spec.layers[0].tooltip, vec![("GPU".to_string(), "gpu".to_string())]);
        assert!(spec.layers[1].tooltip.is_empty());
    }

    #[test]
    fn labels_come_from_first_mark() {
        let ds = dataset(json!([{"ttlt_p50": 1, "gpu": "H100", "zz": 3}]));
        let options = PreviewOptions {
            labels: LabelTable::with_overrides(&Default::default()),
            ..Default::default()
        };
        let marks = vec![Mark::dot(Some("zz".into()), Some("ttlt_p50".into()))];
        let spec = build_spec(&marks, &ds, &options);
        assert_eq!(spec.x_label.as_deref(), Some("zz"));
        assert_eq!(spec.y_label.as_deref(), Some("Time to last token (seconds, P50)"));
    }

    #[test]
    fn empty_mark_list_builds_empty_spec() {
        let ds = dataset(json!([{"x": 1}]));
        let spec = build_spec(&[], &ds, &PreviewOptions::default());
        assert!(spec.layers.is_empty());
        assert!(spec.x_label.is_none());
        assert!(spec.y_domain.is_none());
    }

    #[derive(Default)]
    struct Log {
        live: usize,
        rendered: usize,
        released: usize,
    }

    struct CountingRenderer {
        log: Rc<RefCell<Log>>,
        fail: bool,
    }

    impl Renderer for CountingRenderer {
        type Handle = usize;

        fn render(&mut self, _spec: &PlotSpec, _dataset: &Dataset) -> Result<usize> {
            if self.fail {
                return Err(eyre!("boom"));
            }
            let mut log = self.log.borrow_mut();
            assert_eq!(log.live, 0, "previous handle still live");
            log.live += 1;
            log.rendered += 1;
            Ok(log.rendered)
        }

        fn release(&mut self, _handle: usize) {
            let mut log = self.log.borrow_mut();
            log.live -= 1;
            log.released += 1;
        }
    }

    #[test]
    fn preview_releases_before_rerender_and_on_drop() {
        let log = Rc::new(RefCell::new(Log::default()));
        let ds = dataset(json!([{"x": 1, "y": 2}]));
        let marks = vec![Mark::dot(Some("x".into()), Some("y".into()))];
        {
            let mut preview = Preview::new(CountingRenderer {
                log: log.clone(),
                fail: false,
            });
            for _ in 0..3 {
                let spec = build_spec(&marks, &ds, &PreviewOptions::default());
                preview.refresh(spec, &ds).unwrap();
            }
            assert_eq!(preview.handle(), Some(&3));
            assert_eq!(log.borrow().live, 1);
        }
        let log = log.borrow();
        assert_eq!(log.live, 0);
        assert_eq!(log.released, 3);
    }

    #[test]
    fn failed_render_leaves_preview_empty() {
        let log = Rc::new(RefCell::new(Log::default()));
        let ds = dataset(json!([{"x": 1}]));
        let mut preview = Preview::new(CountingRenderer {
            log: log.clone(),
            fail: true,
        });
        assert!(preview
            .refresh(build_spec(&[], &ds, &PreviewOptions::default()), &ds)
            .is_err());
        assert!(preview.handle().is_none());
    }
}
