//! Sidebar with one form per mark: kind switcher, channel selectors and a
//! remove button, then the add button.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::config::Theme;
use crate::mark::MarkKind;
use crate::plot_editor::{Field, Focus, PlotEditor};

const LABEL_WIDTH: usize = 8;

pub struct MarkList<'a> {
    editor: &'a PlotEditor,
    theme: &'a Theme,
}

impl<'a> MarkList<'a> {
    pub fn new(editor: &'a PlotEditor, theme: &'a Theme) -> Self {
        Self { editor, theme }
    }

    /// All form lines plus the index of the focused one.
    fn lines(&self) -> (Vec<Line<'a>>, usize) {
        let focus = self.editor.focus();
        let active = Style::default().fg(self.theme.get("modal_border_active"));
        let primary = Style::default().fg(self.theme.get("text_primary"));
        let secondary = Style::default().fg(self.theme.get("text_secondary"));
        let border = Style::default().fg(self.theme.get("sidebar_border"));

        let mut lines = Vec::new();
        let mut focused_line = 0;

        for (index, editor) in self.editor.editors().iter().enumerate() {
            let is = |field: Field| focus == Focus::Mark { index, field };

            lines.push(Line::from(Span::styled(format!("── Mark {} ", index + 1), border)));

            if is(Field::Kind) {
                focused_line = lines.len();
            }
            let mut kind_spans = vec![Span::styled(
                format!("{:<LABEL_WIDTH$}", "Kind"),
                if is(Field::Kind) { active } else { primary },
            )];
            for kind in MarkKind::ALL {
                let selected = editor.kind() == kind;
                let marker = if selected { "●" } else { "○" };
                let style = if selected && is(Field::Kind) {
                    active.bold()
                } else if selected {
                    primary
                } else {
                    secondary
                };
                kind_spans.push(Span::styled(format!("{} {}  ", marker, kind.as_str()), style));
            }
            lines.push(Line::from(kind_spans));

            for (i, selector) in editor.selectors().iter().enumerate() {
                let focused = is(Field::Channel(i));
                if focused {
                    focused_line = lines.len();
                }
                let label_style = if focused { active } else { primary };
                let line = if selector.is_shown() {
                    let value = selector.value_label().unwrap_or_default();
                    let toggle = if selector.required { "  " } else { "✕ " };
                    Line::from(vec![
                        Span::styled(format!("{:<LABEL_WIDTH$}", selector.title()), label_style),
                        Span::styled(format!("‹ {} ›", value), if focused { active } else { primary }),
                        Span::styled(format!(" {}", toggle), secondary),
                    ])
                } else {
                    Line::from(Span::styled(
                        format!("+ {}", selector.title()),
                        if focused { active } else { secondary },
                    ))
                };
                lines.push(line);
            }

            if is(Field::Delete) {
                focused_line = lines.len();
            }
            lines.push(Line::from(Span::styled(
                "✕ Remove mark",
                if is(Field::Delete) { active } else { secondary },
            )));
            lines.push(Line::default());
        }

        if focus == Focus::AddMark {
            focused_line = lines.len();
        }
        lines.push(Line::from(Span::styled(
            "+ Add mark",
            if focus == Focus::AddMark { active.bold() } else { primary },
        )));

        (lines, focused_line)
    }
}

impl Widget for MarkList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(" Marks ");
        let inner = block.inner(area);
        block.render(area, buf);

        let (lines, focused_line) = self.lines();
        let height = inner.height as usize;
        let scroll = focused_line.saturating_sub(height.saturating_sub(2));
        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .render(inner, buf);
    }
}
