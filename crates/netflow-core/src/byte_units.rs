//! Conversion of human-readable byte counters (`"168.67 M"`) into numbers.
//!
//! Flow exports render byte counters with a binary unit suffix. Multipliers
//! are 1024-based to stay compatible with the exporting appliance.

use tracing::warn;

use crate::error::{NetflowError, Result};

/// One kibibyte.
pub const KIB: f64 = 1024.0;
/// One mebibyte.
pub const MIB: f64 = 1024.0 * 1024.0;
/// One gibibyte.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Placeholder cells that mean "no traffic recorded".
const EMPTY_MARKERS: &[&str] = &["", "-", "--"];

// ── ByteUnitParser ────────────────────────────────────────────────────────────

/// Parses byte counters from the formats found in flow CSV exports.
pub struct ByteUnitParser;

impl ByteUnitParser {
    /// Convert an optional cell into a byte count.
    ///
    /// * `None` (missing cell) → `0.0`
    /// * placeholder (`""`, `"-"`, `"--"`) → `0.0`
    /// * `K` / `M` / `G` suffix (any case) → prefix × 1024ⁿ
    /// * anything unparseable → `0.0` with a warning; never fails
    pub fn parse(value: Option<&str>) -> f64 {
        match value {
            Some(s) => Self::parse_str(s),
            None => 0.0,
        }
    }

    /// Convert a cell string, degrading to `0.0` on bad input.
    pub fn parse_str(s: &str) -> f64 {
        match Self::try_parse(s) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Warning: {}", e);
                0.0
            }
        }
    }

    /// Strict conversion that reports the unparseable value.
    ///
    /// The result is always finite and non-negative when `Ok`.
    pub fn try_parse(s: &str) -> Result<f64> {
        let cleaned = s.trim().to_uppercase();
        if EMPTY_MARKERS.contains(&cleaned.as_str()) {
            return Ok(0.0);
        }
        let compact: String = cleaned.chars().filter(|c| *c != ' ').collect();

        let (number, multiplier) = if let Some(prefix) = compact.strip_suffix('K') {
            (prefix, KIB)
        } else if let Some(prefix) = compact.strip_suffix('M') {
            (prefix, MIB)
        } else if let Some(prefix) = compact.strip_suffix('G') {
            (prefix, GIB)
        } else {
            (compact.as_str(), 1.0)
        };

        let value = number
            .parse::<f64>()
            .map_err(|_| NetflowError::ByteParse(compact.clone()))?
            * multiplier;

        if !value.is_finite() || value < 0.0 {
            return Err(NetflowError::ByteParse(compact));
        }
        Ok(value)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
