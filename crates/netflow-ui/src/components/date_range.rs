use chrono::{DateTime, Utc};
use netflow_core::time_utils::TimezoneHandler;
use ratatui::text::{Line, Span};

use crate::themes::Theme;

/// Date-range picker rendering the selected window against the data bounds.
///
/// The first line shows the selected start and end dates; the second line is
/// a track across the full data range with the selected portion highlighted.
pub struct DateRangeBar<'a> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Earliest timestamp in the dataset.
    pub min: DateTime<Utc>,
    /// Latest timestamp in the dataset.
    pub max: DateTime<Utc>,
    pub timestamps: &'a TimezoneHandler,
    pub theme: &'a Theme,
    pub width: u16,
}

impl<'a> DateRangeBar<'a> {
    pub fn new(
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        (min, max): (DateTime<Utc>, DateTime<Utc>),
        timestamps: &'a TimezoneHandler,
        theme: &'a Theme,
    ) -> Self {
        Self {
            start,
            end,
            min,
            max,
            timestamps,
            theme,
            width: 40,
        }
    }

    fn column_of(&self, ts: DateTime<Utc>) -> usize {
        let span = (self.max - self.min).num_seconds();
        if span <= 0 || self.width == 0 {
            return 0;
        }
        let offset = (ts.clamp(self.min, self.max) - self.min).num_seconds();
        let last = (self.width - 1) as f64;
        ((offset as f64 / span as f64) * last).round() as usize
    }

    /// Selected dates as `Date Range  start → end`.
    pub fn to_line(&self) -> Line<'a> {
        Line::from(vec![
            Span::styled("Date Range ", self.theme.label),
            Span::styled(self.timestamps.format_date(self.start), self.theme.value),
            Span::styled(" \u{2192} ", self.theme.label),
            Span::styled(self.timestamps.format_date(self.end), self.theme.value),
        ])
    }

    /// Track over the data bounds with the selected window filled.
    pub fn track_line(&self) -> Line<'a> {
        let from = self.column_of(self.start);
        let to = self.column_of(self.end).max(from);
        let width = self.width as usize;

        let before = "\u{2500}".repeat(from);
        let selected = "\u{2501}".repeat(to - from + 1);
        let after = "\u{2500}".repeat(width.saturating_sub(to + 1));

        Line::from(vec![
            Span::styled(self.timestamps.format_date(self.min), self.theme.dim),
            Span::raw(" "),
            Span::styled(before, self.theme.slider_empty),
            Span::styled(selected, self.theme.slider_fill),
            Span::styled(after, self.theme.slider_empty),
            Span::raw(" "),
            Span::styled(self.timestamps.format_date(self.max), self.theme.dim),
        ])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
