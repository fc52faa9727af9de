use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are considered dark; 7–15 are considered light. If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Complete theme definition carrying all UI styles used by netflow-ui
/// components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Controls ─────────────────────────────────────────────────────────────
    /// Filled portion of the top-N slider.
    pub slider_fill: Style,
    pub slider_empty: Style,
    /// Slider handle and focused control.
    pub slider_handle: Style,
    pub slider_mark: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,

    // ── Graph ────────────────────────────────────────────────────────────────
    /// Light edges (below a third of the heaviest weight).
    pub edge_light: Style,
    pub edge_medium: Style,
    /// Heavy edges (at least two thirds of the heaviest weight).
    pub edge_heavy: Style,
    pub node: Style,
    pub node_label: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            slider_fill: Style::default().fg(Color::Green),
            slider_empty: Style::default().fg(Color::DarkGray),
            slider_handle: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            slider_mark: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            edge_light: Style::default().fg(Color::DarkGray),
            edge_medium: Style::default().fg(Color::Gray),
            edge_heavy: Style::default().fg(Color::White),
            node: Style::default().fg(Color::Green),
            node_label: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            slider_fill: Style::default().fg(Color::Green),
            slider_empty: Style::default().fg(Color::Gray),
            slider_handle: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            slider_mark: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            edge_light: Style::default().fg(Color::Gray),
            edge_medium: Style::default().fg(Color::DarkGray),
            edge_heavy: Style::default().fg(Color::Black),
            node: Style::default().fg(Color::Green),
            node_label: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette,
    /// without bold modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            slider_fill: Style::default().fg(Color::Green),
            slider_empty: Style::default().fg(Color::DarkGray),
            slider_handle: Style::default().fg(Color::Yellow),
            slider_mark: Style::default().fg(Color::White),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),

            edge_light: Style::default().fg(Color::DarkGray),
            edge_medium: Style::default().fg(Color::Gray),
            edge_heavy: Style::default().fg(Color::White),
            node: Style::default().fg(Color::Green),
            node_label: Style::default().fg(Color::White),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Edge style for a line of `weight` relative to the heaviest line.
    ///
    /// * `< 1/3`   → `edge_light`
    /// * `1/3–2/3` → `edge_medium`
    /// * `≥ 2/3`   → `edge_heavy`
    pub fn edge_style(&self, weight: f64, max_weight: f64) -> Style {
        if max_weight <= 0.0 {
            return self.edge_light;
        }
        let ratio = weight / max_weight;
        if ratio >= 2.0 / 3.0 {
            self.edge_heavy
        } else if ratio >= 1.0 / 3.0 {
            self.edge_medium
        } else {
            self.edge_light
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
