//! Application state and TUI event loop for the netflow dashboard.
//!
//! [`App`] owns the loaded flow table, the control values (top-N slider and
//! date range) and the figure computed from them. Every control change
//! recomputes the figure through [`update_figure`].

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    cursor::Show,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::{debug, error, info, warn};

use netflow_core::formatting;
use netflow_core::models::FlowTable;
use netflow_core::settings::{TOP_N_DEFAULT, TOP_N_MAX, TOP_N_MIN};
use netflow_core::time_utils::TimezoneHandler;
use netflow_data::aggregator::NormalizationMode;
use netflow_data::analysis::{update_figure, FigureQuery, FigureUpdate};

use crate::components::date_range::DateRangeBar;
use crate::components::header::Header;
use crate::components::slider::TopNSlider;
use crate::export;
use crate::graph_view;
use crate::table_view::{self, TableTotals};
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Circular host-group graph.
    #[default]
    Graph,
    /// Top connections table.
    Table,
}

impl ViewMode {
    /// Parse a view name, defaulting to [`ViewMode::Graph`].
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "table" => ViewMode::Table,
            _ => ViewMode::Graph,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Graph => "graph",
            ViewMode::Table => "table",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Graph => ViewMode::Table,
            ViewMode::Table => ViewMode::Graph,
        }
    }
}

// ── Controls ──────────────────────────────────────────────────────────────────

/// Integer slider for the number of connections, clamped to
/// `[TOP_N_MIN, TOP_N_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopNControl {
    value: u32,
}

impl TopNControl {
    pub fn new(value: u32) -> Self {
        Self {
            value: value.clamp(TOP_N_MIN, TOP_N_MAX),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Step up by one; returns `true` when the value changed.
    pub fn increment(&mut self) -> bool {
        self.set(self.value.saturating_add(1))
    }

    /// Step down by one; returns `true` when the value changed.
    pub fn decrement(&mut self) -> bool {
        self.set(self.value.saturating_sub(1))
    }

    pub fn set(&mut self, value: u32) -> bool {
        let next = value.clamp(TOP_N_MIN, TOP_N_MAX);
        let changed = next != self.value;
        self.value = next;
        changed
    }
}

impl Default for TopNControl {
    fn default() -> Self {
        Self::new(TOP_N_DEFAULT)
    }
}

/// Selected date window inside the dataset bounds.
///
/// Both ends move in whole days, stay inside the bounds and never cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeControl {
    min: DateTime<Utc>,
    max: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRangeControl {
    /// Full-range selection over `(min, max)`.
    pub fn new((min, max): (DateTime<Utc>, DateTime<Utc>)) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            start: min,
            end: max,
        }
    }

    /// Start from an explicit selection, clamped to the bounds.
    pub fn with_selection(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let start = start.clamp(self.min, self.max);
        let end = end.clamp(self.min, self.max);
        if start <= end {
            self.start = start;
            self.end = end;
        } else {
            self.start = end;
            self.end = start;
        }
        self
    }

    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.min, self.max)
    }

    pub fn selection(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }

    /// Move the start by `days`; returns `true` when the selection changed.
    pub fn shift_start(&mut self, days: i64) -> bool {
        let next = (self.start + chrono::Duration::days(days)).clamp(self.min, self.end);
        let changed = next != self.start;
        self.start = next;
        changed
    }

    /// Move the end by `days`; returns `true` when the selection changed.
    pub fn shift_end(&mut self, days: i64) -> bool {
        let next = (self.end + chrono::Duration::days(days)).clamp(self.start, self.max);
        let changed = next != self.end;
        self.end = next;
        changed
    }

    /// Select the full bounds again.
    pub fn reset(&mut self) -> bool {
        let changed = self.start != self.min || self.end != self.max;
        self.start = self.min;
        self.end = self.max;
        changed
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Start-up configuration for [`App`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub theme: String,
    pub view_mode: ViewMode,
    /// Path or URL shown in the header.
    pub source: String,
    /// IANA timezone for displayed dates.
    pub timezone: String,
    pub top_n: u32,
    /// Initial window; `None` selects the full data range.
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub mode: NormalizationMode,
    /// Where `e` writes the HTML figure.
    pub export_path: PathBuf,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            theme: "auto".to_string(),
            view_mode: ViewMode::Graph,
            source: String::new(),
            timezone: "UTC".to_string(),
            top_n: TOP_N_DEFAULT,
            range: None,
            mode: NormalizationMode::AfterSum,
            export_path: PathBuf::from("netflow-connections.html"),
        }
    }
}

/// Root application state for the netflow TUI.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub source: String,
    pub timezone: String,
    pub top_n: TopNControl,
    /// `None` when the table has no dated flows.
    pub range: Option<DateRangeControl>,
    pub mode: NormalizationMode,
    pub export_path: PathBuf,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Last status message (export result, errors).
    pub status: Option<String>,
    /// Figure for the current control values.
    pub update: Option<FigureUpdate>,
    table: FlowTable,
    timestamps: TimezoneHandler,
}

impl App {
    pub fn new(table: FlowTable, options: AppOptions) -> Self {
        let range = table.time_bounds().map(|bounds| {
            let control = DateRangeControl::new(bounds);
            match options.range {
                Some((start, end)) => control.with_selection(start, end),
                None => control,
            }
        });

        let mut app = Self {
            theme: Theme::from_name(&options.theme),
            view_mode: options.view_mode,
            source: options.source,
            timestamps: TimezoneHandler::new(&options.timezone),
            timezone: options.timezone,
            top_n: TopNControl::new(options.top_n),
            range,
            mode: options.mode,
            export_path: options.export_path,
            should_quit: false,
            status: None,
            update: None,
            table,
        };
        app.recompute();
        app
    }

    /// Query for the current control values, `None` without dated flows.
    pub fn query(&self) -> Option<FigureQuery> {
        let (start, end) = self.range?.selection();
        Some(FigureQuery {
            start,
            end,
            top_n: self.top_n.value() as usize,
            mode: self.mode,
        })
    }

    /// Recompute the figure from the current control values.
    pub fn recompute(&mut self) {
        self.update = self.query().map(|q| update_figure(&self.table, &q));
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Apply one key press. Recomputes when a control changed.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status = None;
        let changed = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                false
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                false
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => self.top_n.increment(),
            KeyCode::Char('-') | KeyCode::Left => self.top_n.decrement(),
            KeyCode::Char('[') => self.shift_range(|r| r.shift_start(-1)),
            KeyCode::Char(']') => self.shift_range(|r| r.shift_start(1)),
            KeyCode::Char('{') => self.shift_range(|r| r.shift_end(-1)),
            KeyCode::Char('}') => self.shift_range(|r| r.shift_end(1)),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let slider = self.top_n.set(TOP_N_DEFAULT);
                let dates = self.shift_range(DateRangeControl::reset);
                slider || dates
            }
            KeyCode::Char('v') | KeyCode::Char('V') => {
                self.view_mode = self.view_mode.toggled();
                false
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.export();
                false
            }
            _ => false,
        };

        if changed {
            debug!(
                top_n = self.top_n.value(),
                view = self.view_mode.as_str(),
                "controls changed"
            );
            self.recompute();
        }
    }

    fn shift_range(&mut self, f: impl FnOnce(&mut DateRangeControl) -> bool) -> bool {
        self.range.as_mut().is_some_and(f)
    }

    /// Write the current figure to `export_path`.
    pub fn export(&mut self) {
        let Some(update) = &self.update else {
            self.status = Some("Nothing to export".to_string());
            return;
        };
        match export::export_html(&update.figure, &self.export_path) {
            Ok(()) => {
                self.status = Some(format!("Exported to {}", self.export_path.display()));
            }
            Err(e) => {
                error!("HTML export failed: {}", e);
                self.status = Some(format!("Export failed: {}", e));
            }
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive TUI until `q` / `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout and yields to the
    /// runtime between ticks so an outer signal handler can still fire.
    pub async fn run(mut self) -> io::Result<()> {
        let _guard = TerminalGuard::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);
        info!("Interactive shell started");

        let result: io::Result<()> = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
            tokio::task::yield_now().await;
        };

        result
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, controls_area, main_area, footer_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .areas(area);

        let header = Header::new(&self.source, &self.timezone, &self.theme);
        frame.render_widget(Paragraph::new(Text::from(header.to_lines())), header_area);

        let (Some(range), Some(update)) = (self.range, self.update.as_ref()) else {
            table_view::render_no_data(frame, main_area.union(controls_area), &self.theme);
            self.render_footer(frame, footer_area);
            return;
        };

        self.render_controls(frame, controls_area, &range);

        match self.view_mode {
            ViewMode::Graph => {
                graph_view::render_graph_view(frame, main_area, &update.figure, &self.theme);
            }
            ViewMode::Table => {
                let totals =
                    TableTotals::from_connections(&update.connections, update.metadata.window_bytes);
                table_view::render_table_view(
                    frame,
                    main_area,
                    "Top Connections",
                    &update.connections,
                    &totals,
                    &self.theme,
                );
            }
        }

        self.render_footer(frame, footer_area);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect, range: &DateRangeControl) {
        let slider = TopNSlider::new(self.top_n.value(), TOP_N_MIN, TOP_N_MAX, &self.theme);
        let dates = DateRangeBar::new(
            range.selection(),
            range.bounds(),
            &self.timestamps,
            &self.theme,
        );

        let summary = self.update.as_ref().map(|u| {
            Line::from(vec![
                Span::styled("Showing ", self.theme.label),
                Span::styled(u.connections.len().to_string(), self.theme.value),
                Span::styled(" of ", self.theme.label),
                Span::styled(u.metadata.distinct_pairs.to_string(), self.theme.value),
                Span::styled(" connections · ", self.theme.label),
                Span::styled(formatting::format_bytes(u.shown_bytes()), self.theme.value),
                Span::styled(" of ", self.theme.label),
                Span::styled(
                    formatting::format_bytes(u.metadata.window_bytes),
                    self.theme.value,
                ),
            ])
        });

        let mut lines = vec![
            slider.to_line(),
            slider.marks_line(),
            dates.to_line(),
            dates.track_line(),
        ];
        lines.extend(summary);
        frame.render_widget(Paragraph::new(Text::from(lines)), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some(msg) => Line::from(Span::styled(msg.clone(), self.theme.info)),
            None => Line::from(Span::styled(
                "+/- top N · [ ] start · { } end · r reset · v view · e export · q quit",
                self.theme.dim,
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

// ── Terminal guard ─────────────────────────────────────────────────────────────

/// Raw mode plus the alternate screen, undone on drop.
///
/// Dropping the [`App::run`] future (e.g. from an outer `select!`) still
/// restores the shell.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal(&mut io::stdout()) {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

fn restore_terminal(out: &mut impl io::Write) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, LeaveAlternateScreen, Show)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
