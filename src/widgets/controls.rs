use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    widgets::{Paragraph, Widget},
};

use crate::config::Theme;

const CONTROLS: [(&str, &str); 8] = [
    ("Tab", "Field"),
    ("←→", "Change"),
    ("Spc", "Toggle"),
    ("a", "Add"),
    ("d", "Remove"),
    ("[]", "Probe"),
    ("e", "Export"),
    ("q", "Quit"),
];

pub struct Controls<'a> {
    pub row_count: Option<usize>,
    pub dimmed: bool,
    pub theme: &'a Theme,
}

impl<'a> Controls<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            row_count: None,
            dimmed: false,
            theme,
        }
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }
}

impl Widget for &Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });

        if self.row_count.is_some() {
            constraints.push(Constraint::Length(15)); // "Rows: 12345"
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bg = self.theme.get("controls_bg");

        let base_style = if self.dimmed {
            Style::default().fg(self.theme.get("dimmed"))
        } else {
            Style::default()
        };
        let key_style = if self.dimmed {
            base_style
        } else {
            base_style.fg(self.theme.get("keybind_hints"))
        };
        let action_style = if self.dimmed {
            base_style.bg(bg)
        } else {
            base_style.bg(bg).fg(self.theme.get("keybind_labels"))
        };

        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(key_style.bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(action_style)
                .render(layout[j + 1], buf);
        }

        let mut fill_start_idx = CONTROLS.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(action_style)
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(bg))
            .render(layout[fill_start_idx], buf);
    }
}
