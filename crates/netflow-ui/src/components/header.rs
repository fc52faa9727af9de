use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Dashboard title shown above the controls.
pub const DASHBOARD_TITLE: &str = "Network Flow Host Group Connections";

/// Dashboard header rendering four lines:
///
/// 1. Dashboard title in capitals.
/// 2. A 60-column `=` separator.
/// 3. Data source and display timezone as `[ source | timezone ]`.
/// 4. An empty line.
pub struct Header<'a> {
    /// Path or URL the flows were loaded from.
    pub source: &'a str,
    /// IANA timezone used for displayed dates.
    pub timezone: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(source: &'a str, timezone: &'a str, theme: &'a Theme) -> Self {
        Self {
            source,
            timezone,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(Span::styled(
                DASHBOARD_TITLE.to_uppercase(),
                self.theme.header,
            )),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
