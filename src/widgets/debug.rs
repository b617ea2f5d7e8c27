use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    pub last_type_name: String,
    /// Last action taken (e.g. "cycle_focused") for debugging key handling.
    pub last_action: String,
    pub enabled: bool,
    pub num_refreshes: usize,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
        self.last_type_name = format!("{:?}", event.kind);
    }

    /// Strip widget showing these counters next to the preview's revision.
    pub fn strip(&self, revision: Option<u64>) -> DebugStrip<'_> {
        DebugStrip {
            state: self,
            revision,
        }
    }
}

pub struct DebugStrip<'a> {
    state: &'a DebugState,
    revision: Option<u64>,
}

impl Widget for DebugStrip<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        let revision = self
            .revision
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        Paragraph::new(format!(
            "events={} keys={} last_key={} kind={} last_action={} frames={} revision={} refreshes={}",
            state.num_events,
            state.num_key_events,
            state.last_key_event_name,
            state.last_type_name,
            state.last_action,
            state.num_frames,
            revision,
            state.num_refreshes,
        ))
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_shows_preview_revision() {
        let state = DebugState {
            num_refreshes: 2,
            ..Default::default()
        };
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        state.strip(Some(7)).render(area, &mut buf);
        let line: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(line.contains("revision=7 refreshes=2"));

        let mut buf = Buffer::empty(area);
        state.strip(None).render(area, &mut buf);
        let line: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(line.contains("revision=-"));
    }
}
