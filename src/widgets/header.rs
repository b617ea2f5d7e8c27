use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use url::Url;

use crate::bootstrap::{MountPoint, Preset};
use crate::config::Theme;

/// Status line severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Error,
}

/// Share link, partial-result banner, status message and sample presets.
pub struct Header<'a> {
    pub location: &'a Url,
    pub mount: MountPoint,
    pub banner: Option<&'a str>,
    pub status: Option<(&'a str, Status)>,
    pub presets: &'a [&'a Preset],
    pub theme: &'a Theme,
}

impl Header<'_> {
    /// Rows needed to draw everything.
    pub fn height(&self) -> u16 {
        2 + u16::from(self.banner.is_some()) + u16::from(!self.presets.is_empty())
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = Style::default().bg(self.theme.get("controls_bg"));
        let label = Style::default().fg(self.theme.get("text_secondary"));

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{} · Share: ", self.mount.as_str()), label),
            Span::styled(
                self.location.as_str().to_string(),
                Style::default().fg(self.theme.get("link")).underlined(),
            ),
        ])];

        if let Some(banner) = self.banner {
            lines.push(Line::from(Span::styled(
                banner.to_string(),
                Style::default().fg(self.theme.get("warning")).bold(),
            )));
        }

        if !self.presets.is_empty() {
            let mut spans = vec![Span::styled("Samples: ", label)];
            for (i, preset) in self.presets.iter().enumerate().take(9) {
                spans.push(Span::styled(
                    format!("{}", i + 1),
                    Style::default().fg(self.theme.get("keybind_hints")).bold(),
                ));
                spans.push(Span::styled(
                    format!(" {}  ", preset.name),
                    Style::default().fg(self.theme.get("keybind_labels")),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(match self.status {
            Some((msg, Status::Info)) => Line::from(Span::styled(
                msg.to_string(),
                Style::default().fg(self.theme.get("success")),
            )),
            Some((msg, Status::Error)) => Line::from(Span::styled(
                msg.to_string(),
                Style::default().fg(self.theme.get("error")),
            )),
            None => Line::default(),
        });

        Paragraph::new(lines).style(bg).render(area, buf);
    }
}
