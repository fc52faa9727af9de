//! Flow records, the loaded table, and aggregated host-group connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Column names ──────────────────────────────────────────────────────────────

/// CSV header of the flow start timestamp.
pub const COL_START: &str = "Start";
/// CSV header of the raw subject host-group list.
pub const COL_SUBJECT_HOST_GROUPS: &str = "Subject Host Groups";
/// CSV header of the raw peer host-group list.
pub const COL_PEER_HOST_GROUPS: &str = "Peer Host Groups";
/// CSV header of the subject byte counter.
pub const COL_SUBJECT_BYTES: &str = "Subject Bytes";
/// CSV header of the peer byte counter.
pub const COL_PEER_BYTES: &str = "Peer Bytes";
/// CSV header of the total byte counter.
pub const COL_TOTAL_BYTES: &str = "Total Bytes";

// ── FlowRecord ────────────────────────────────────────────────────────────────

/// One observed flow with byte counters already converted to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Flow start. `None` when the source cell could not be parsed.
    pub start: Option<DateTime<Utc>>,
    /// Raw comma-separated subject host groups.
    pub subject_host_groups: String,
    /// Raw comma-separated peer host groups.
    pub peer_host_groups: String,
    pub subject_bytes: f64,
    pub peer_bytes: f64,
    pub total_bytes: f64,
}

impl FlowRecord {
    /// `true` when the record started inside `[start, end]` (both inclusive).
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        matches!(self.start, Some(ts) if ts >= start && ts <= end)
    }
}

// ── FlowTable ─────────────────────────────────────────────────────────────────

/// The in-memory dataset. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    pub records: Vec<FlowRecord>,
}

impl FlowTable {
    pub fn new(records: Vec<FlowRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest parseable start timestamps.
    ///
    /// Returns `None` when no record carries a timestamp.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut starts = self.records.iter().filter_map(|r| r.start);
        let first = starts.next()?;
        Some(starts.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts))))
    }

    /// Records whose start lies within `[start, end]`.
    pub fn filter_by_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &FlowRecord> + '_ {
        self.records.iter().filter(move |r| r.within(start, end))
    }
}

// ── Host groups ───────────────────────────────────────────────────────────────

/// Reduce a raw host-group list to its display label.
///
/// The label is the text before the first comma with surrounding whitespace
/// removed: `"End User Devices, Atlanta"` → `"End User Devices"`.
pub fn normalize_host_group(raw: &str) -> String {
    raw.split(',').next().unwrap_or_default().trim().to_string()
}

// ── AggregatedConnection ──────────────────────────────────────────────────────

/// Summed traffic between a subject and a peer host group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedConnection {
    pub subject: String,
    pub peer: String,
    /// Sum of `total_bytes`; the ranking key.
    pub total_bytes: f64,
    pub subject_bytes: f64,
    pub peer_bytes: f64,
    /// Number of flow records folded into this row.
    pub flow_count: u32,
}

impl AggregatedConnection {
    pub fn new(subject: impl Into<String>, peer: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            peer: peer.into(),
            total_bytes: 0.0,
            subject_bytes: 0.0,
            peer_bytes: 0.0,
            flow_count: 0,
        }
    }

    /// Accumulate a single record's counters.
    pub fn add_record(&mut self, record: &FlowRecord) {
        self.total_bytes += record.total_bytes;
        self.subject_bytes += record.subject_bytes;
        self.peer_bytes += record.peer_bytes;
        self.flow_count += 1;
    }

    /// Fold another row's counters into this one.
    pub fn merge(&mut self, other: &AggregatedConnection) {
        self.total_bytes += other.total_bytes;
        self.subject_bytes += other.subject_bytes;
        self.peer_bytes += other.peer_bytes;
        self.flow_count += other.flow_count;
    }

    /// `true` when `group` is either endpoint.
    pub fn involves(&self, group: &str) -> bool {
        self.subject == group || self.peer == group
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
