use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Configuration controlling visual appearance of a slider.
pub struct SliderConfig {
    /// Width in terminal columns of the track (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    pub handle_char: char,
    /// Distance between labelled tick marks.
    pub mark_step: u32,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2501}', // ━  HEAVY HORIZONTAL
            empty_char: '\u{2500}',  // ─  LIGHT HORIZONTAL
            handle_char: '\u{25CF}', // ●  BLACK CIRCLE
            mark_step: 2,
        }
    }
}

// ── TopNSlider ───────────────────────────────────────────────────────────────

/// Horizontal integer slider for the number of connections shown.
///
/// Renders a track with a handle at the current value followed by the value
/// itself, plus a second line carrying tick labels every `mark_step` values.
pub struct TopNSlider<'a> {
    pub value: u32,
    pub min: u32,
    pub max: u32,
    pub theme: &'a Theme,
    pub config: SliderConfig,
}

impl<'a> TopNSlider<'a> {
    pub fn new(value: u32, min: u32, max: u32, theme: &'a Theme) -> Self {
        Self {
            value: value.clamp(min, max.max(min)),
            min,
            max: max.max(min),
            theme,
            config: SliderConfig::default(),
        }
    }

    /// Column of `value` on the track, in `0..width`.
    pub fn column_of(&self, value: u32) -> u16 {
        let span = self.max - self.min;
        if span == 0 || self.config.width == 0 {
            return 0;
        }
        let last = (self.config.width - 1) as f64;
        let frac = (value.clamp(self.min, self.max) - self.min) as f64 / span as f64;
        (frac * last).round() as u16
    }

    /// Values that receive a tick label.
    pub fn marks(&self) -> Vec<u32> {
        let step = self.config.mark_step.max(1) as usize;
        (self.min..=self.max).step_by(step).collect()
    }

    /// Render the track as a [`Line`].
    pub fn to_line(&self) -> Line<'a> {
        let handle = self.column_of(self.value);
        let after = self.config.width.saturating_sub(handle + 1);

        let filled: String =
            std::iter::repeat_n(self.config.filled_char, handle as usize).collect();
        let empty: String = std::iter::repeat_n(self.config.empty_char, after as usize).collect();

        Line::from(vec![
            Span::styled("Top N ", self.theme.label),
            Span::styled(filled, self.theme.slider_fill),
            Span::styled(self.config.handle_char.to_string(), self.theme.slider_handle),
            Span::styled(empty, self.theme.slider_empty),
            Span::styled(format!(" {}", self.value), self.theme.value),
        ])
    }

    /// Render the tick labels aligned under the track.
    pub fn marks_line(&self) -> Line<'a> {
        // Offset matches the "Top N " prefix of `to_line`.
        let mut row: Vec<char> = vec![' '; 6 + self.config.width as usize + 3];
        for mark in self.marks() {
            let col = 6 + self.column_of(mark) as usize;
            for (i, ch) in mark.to_string().chars().enumerate() {
                if let Some(cell) = row.get_mut(col + i) {
                    *cell = ch;
                }
            }
        }
        let text: String = row.into_iter().collect();
        Line::from(Span::styled(text.trim_end().to_string(), self.theme.slider_mark))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
