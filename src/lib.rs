use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use tracing::{debug, error, info};
use url::Url;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Paragraph};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod bootstrap;
pub mod channel;
pub mod chart_data;
pub mod chart_export;
pub mod config;
pub mod dataset;
pub mod error_display;
pub mod mark;
pub mod mark_editor;
pub mod plot_editor;
pub mod preview;
pub mod share;
pub mod source;
pub mod widgets;

pub use bootstrap::{bootstrap, Bootstrap, BootstrapOptions, MountPoint, Preset};
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use datasette_plot_cli::Args;
pub use mark::{Mark, MarkKind};
pub use plot_editor::PlotEditor;
pub use preview::{build_spec, Preview, PreviewOptions, Renderer};
pub use share::{share_url, Host, MemoryHost};
pub use source::RowSource;

use bootstrap::sample_presets;
use chart_export::PngRenderer;
use plot_editor::Focus;
use widgets::chart::{render_chart_view, TerminalRenderer};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::header::{Header, Status};
use widgets::mark_list::MarkList;

/// Application name used for config, cache and log paths
pub const APP_NAME: &str = "datasette-plot";

const SIDEBAR_WIDTH: u16 = 46;

pub enum AppEvent {
    Key(KeyEvent),
    /// Load a new page location (sample presets, startup)
    Open(Url),
    /// Internal event to perform the fetch after the UI shows "Loading"
    DoLoad(Url),
    Export,
    Exit,
    Resize(u16, u16),
}

/// State for one mounted location.
struct Session {
    mount: MountPoint,
    dataset: dataset::Dataset,
    editor: PlotEditor,
    banner: Option<String>,
}

pub struct App {
    config: AppConfig,
    theme: Theme,
    source: Box<dyn RowSource>,
    host: MemoryHost,
    session: Option<Session>,
    preview: Preview<TerminalRenderer>,
    preview_options: PreviewOptions,
    /// Mark-list revision the preview was last rendered at.
    shown_revision: Option<u64>,
    /// Index into the frame's tip points; `None` when not probing.
    probe: Option<usize>,
    status: Option<(String, Status)>,
    export_path: PathBuf,
    debug: DebugState,
}

impl App {
    pub fn new(
        config: AppConfig,
        source: Box<dyn RowSource>,
        location: Url,
    ) -> Result<App> {
        let theme = Theme::from_config(&config.theme)?;
        let preview_options = config.preview_options();
        let debug = DebugState {
            enabled: config.debug.enabled,
            ..Default::default()
        };
        Ok(App {
            theme,
            source,
            host: MemoryHost::new(location),
            session: None,
            preview: Preview::new(TerminalRenderer::new()),
            preview_options,
            shown_revision: None,
            probe: None,
            status: None,
            export_path: PathBuf::from("datasette-plot.png"),
            debug,
            config,
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn with_export_path(mut self, path: PathBuf) -> Self {
        self.export_path = path;
        self
    }

    /// Current share link.
    pub fn location(&self) -> &Url {
        self.host.location()
    }

    pub fn editor(&self) -> Option<&PlotEditor> {
        self.session.as_ref().map(|s| &s.editor)
    }

    pub fn preview(&self) -> &Preview<TerminalRenderer> {
        &self.preview
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(s, _)| s.as_str())
    }

    fn set_error(&mut self, message: String) {
        error!("{}", message);
        self.status = Some((message, Status::Error));
    }

    fn load(&mut self, location: &Url) {
        let options = self.config.bootstrap_options();
        match bootstrap(location, self.source.as_ref(), &options) {
            Ok(b) => {
                let editor = PlotEditor::new(b.marks, &b.dataset, &options.group_key);
                self.session = Some(Session {
                    mount: b.mount,
                    dataset: b.dataset,
                    editor,
                    banner: b.banner,
                });
                self.host.navigate(b.location);
                self.status = None;
                self.probe = None;
                self.shown_revision = None;
                self.refresh_preview();
            }
            Err(e) => {
                let msg = error_display::user_message_from_report(&e);
                self.set_error(msg);
            }
        }
    }

    /// Re-render and sync the share link if the mark list moved on.
    fn refresh_preview(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let revision = session.editor.revision();
        if self.shown_revision == Some(revision) {
            return;
        }
        let marks = session.editor.marks();
        let spec = build_spec(marks, &session.dataset, &self.preview_options);
        let url = share::sync_host(&mut self.host, marks);
        debug!(%url, revision, "share link synced");
        if let Err(e) = self.preview.refresh(spec, &session.dataset) {
            let msg = error_display::user_message_from_report(&e);
            self.set_error(msg);
        }
        self.shown_revision = Some(revision);
        self.debug.num_refreshes += 1;
    }

    fn export(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let spec = build_spec(session.editor.marks(), &session.dataset, &self.preview_options);
        let mut png = Preview::new(PngRenderer::new(&self.export_path));
        match png.refresh(spec, &session.dataset) {
            Ok(()) => {
                let msg = format!("Exported chart to {}", self.export_path.display());
                info!("{}", msg);
                self.status = Some((msg, Status::Info));
            }
            Err(e) => {
                let msg = error_display::user_message_from_report(&e);
                self.set_error(msg);
            }
        }
    }

    fn step_probe(&mut self, step: isize) {
        let count = self
            .preview
            .handle()
            .map(|f| f.tip_points().len())
            .unwrap_or(0);
        if count == 0 {
            self.probe = None;
            return;
        }
        let len = count as isize;
        let next = match self.probe {
            Some(i) => (i as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.probe = Some(next as usize);
    }

    fn open_preset(&mut self, n: usize) -> Option<AppEvent> {
        let location = self.host.location().clone();
        let preset = sample_presets(&location, &self.config.presets)
            .get(n)
            .map(|p| p.resolve(&location))?;
        match preset {
            Ok(url) => Some(AppEvent::Open(url)),
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);
        if event.kind == KeyEventKind::Release {
            return None;
        }

        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Char('e') => return Some(AppEvent::Export),
            KeyCode::Char(c @ '1'..='9') => {
                return self.open_preset(c as usize - '1' as usize);
            }
            KeyCode::Char(']') => {
                self.step_probe(1);
                return None;
            }
            KeyCode::Char('[') => {
                self.step_probe(-1);
                return None;
            }
            _ => {}
        }

        let editor = &mut self.session.as_mut()?.editor;
        let (action, changed) = match event.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
                editor.move_focus(1);
                ("move_focus", false)
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                editor.move_focus(-1);
                ("move_focus", false)
            }
            KeyCode::PageDown => {
                editor.move_mark_focus(1);
                ("move_mark_focus", false)
            }
            KeyCode::PageUp => {
                editor.move_mark_focus(-1);
                ("move_mark_focus", false)
            }
            KeyCode::Right | KeyCode::Char('l') => ("cycle_focused", editor.cycle_focused(1)),
            KeyCode::Left | KeyCode::Char('h') => ("cycle_focused", editor.cycle_focused(-1)),
            KeyCode::Char(' ') | KeyCode::Enter => ("activate_focused", editor.activate_focused()),
            KeyCode::Char('a') => {
                editor.add_mark();
                ("add_mark", true)
            }
            KeyCode::Char('d') => match editor.focus() {
                Focus::Mark { index, .. } => ("delete_mark", editor.delete_mark(index)),
                Focus::AddMark => ("delete_mark", false),
            },
            _ => return None,
        };
        self.debug.last_action = action.to_string();

        if changed {
            self.probe = None;
            self.refresh_preview();
        }
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(url) => {
                self.status = Some((format!("Loading {}", url), Status::Info));
                Some(AppEvent::DoLoad(url.clone()))
            }
            AppEvent::DoLoad(url) => {
                self.load(url);
                None
            }
            AppEvent::Export => {
                self.export();
                None
            }
            // Exit is handled by the run loop
            AppEvent::Resize(_, _) | AppEvent::Exit => None,
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let location = self.host.location().clone();
        let presets = sample_presets(&location, &self.config.presets);
        let status = self.status.as_ref().map(|(m, s)| (m.as_str(), *s));

        let header = self.session.as_ref().map(|s| Header {
            location: &location,
            mount: s.mount,
            banner: s.banner.as_deref(),
            status,
            presets: &presets,
            theme: &self.theme,
        });
        let header_height = header.as_ref().map(Header::height).unwrap_or(1);

        let mut constraints = vec![
            Constraint::Length(header_height),
            Constraint::Fill(1),
            Constraint::Length(1), // Controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let Some(session) = &self.session else {
            let text = status.map(|(m, _)| m).unwrap_or("Loading...");
            let color = match status {
                Some((_, Status::Error)) => self.theme.get("error"),
                _ => self.theme.get("text_secondary"),
            };
            Paragraph::new(text)
                .style(Style::default().fg(color))
                .render(layout[0], buf);
            Block::default().render(layout[1], buf);
            Controls::new(&self.theme).with_dimmed(true).render(layout[2], buf);
            if self.debug.enabled {
                self.debug.strip(self.shown_revision).render(layout[3], buf);
            }
            return;
        };

        if let Some(header) = header {
            header.render(layout[0], buf);
        }

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
            .split(layout[1]);
        MarkList::new(&session.editor, &self.theme).render(main[0], buf);
        render_chart_view(main[1], buf, self.preview.handle(), self.probe, &self.theme);

        Controls::new(&self.theme)
            .with_row_count(session.dataset.rows.len())
            .render(layout[2], buf);

        if self.debug.enabled {
            self.debug.strip(self.shown_revision).render(layout[3], buf);
        }
    }
}
