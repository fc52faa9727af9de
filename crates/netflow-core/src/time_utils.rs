use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{NetflowError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Timestamp parsing for flow exports plus display conversion.
///
/// Timestamps without an offset are interpreted in the handler's default
/// timezone.
pub struct TimezoneHandler {
    default_tz: Tz,
}

/// Offset-carrying layouts that RFC 3339 rejects, e.g. `+0000`.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Handler that treats naive timestamps as UTC.
    pub fn utc() -> Self {
        Self { default_tz: Tz::UTC }
    }

    /// Parse a flow-export timestamp into UTC.
    ///
    /// Accepts RFC 3339 (including the `Z` suffix), ISO 8601 with compact
    /// offsets such as `2024-11-25T19:10:12.000+0000`, naive date-times and
    /// date-only strings (midnight). Returns `None` for anything else.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return self.localize(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return self.localize(date.and_hms_opt(0, 0, 0)?);
        }
        None
    }

    /// Parse a user-supplied range bound.
    ///
    /// A date-only `end` bound expands to the last instant of that day so the
    /// whole day is included.
    pub fn parse_range_bound(&self, s: &str, is_end: bool) -> Result<DateTime<Utc>> {
        if is_end {
            if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                let last = date
                    .and_hms_nano_opt(23, 59, 59, 999_999_999)
                    .ok_or_else(|| NetflowError::TimestampParse(s.to_string()))?;
                return self
                    .localize(last)
                    .ok_or_else(|| NetflowError::TimestampParse(s.to_string()));
            }
        }
        self.parse_timestamp(s)
            .ok_or_else(|| NetflowError::TimestampParse(s.to_string()))
    }

    /// Format `dt` as a calendar date in the handler's timezone.
    pub fn format_date(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.default_tz)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Format `dt` as date and time in the handler's timezone.
    pub fn format_datetime(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.default_tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.default_tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
