//! Recompute pipeline driven by the interactive controls.
//!
//! Given the loaded [`FlowTable`] and the current control values, produces the
//! top-N connection rows plus the circular figure built from them. The
//! function is pure: the shell calls it on every control change and the
//! export paths call it once.

use std::time::Instant;

use chrono::{DateTime, Utc};
use netflow_core::layout::{build_figure, RenderSpec};
use netflow_core::models::{AggregatedConnection, FlowTable};
use tracing::debug;

use crate::aggregator::{ConnectionAggregator, NormalizationMode};

// ── Public types ──────────────────────────────────────────────────────────────

/// Control values that determine one figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub top_n: usize,
    pub mode: NormalizationMode,
}

/// Metadata produced alongside each recompute.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FigureMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Rows whose start falls inside the window.
    pub rows_in_window: usize,
    /// Distinct connections in the window before truncation.
    pub distinct_pairs: usize,
    /// Bytes moved by every connection in the window.
    pub window_bytes: f64,
    /// Wall-clock seconds spent aggregating and laying out.
    pub compute_time_seconds: f64,
}

/// The complete output of [`update_figure`].
#[derive(Debug, Clone)]
pub struct FigureUpdate {
    /// Top-N rows, heaviest first.
    pub connections: Vec<AggregatedConnection>,
    pub figure: RenderSpec,
    pub metadata: FigureMetadata,
}

impl FigureUpdate {
    /// Bytes covered by the displayed rows.
    pub fn shown_bytes(&self) -> f64 {
        ConnectionAggregator::total_bytes(&self.connections)
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Aggregate the window selected by `query` and lay out its top connections.
///
/// An empty table or an empty window yields no rows and an empty figure.
pub fn update_figure(table: &FlowTable, query: &FigureQuery) -> FigureUpdate {
    let started = Instant::now();

    let rows_in_window = table.filter_by_time(query.start, query.end).count();
    let mut connections =
        ConnectionAggregator::aggregate_window(table, query.start, query.end, query.mode);
    let distinct_pairs = connections.len();
    let window_bytes = ConnectionAggregator::total_bytes(&connections);
    ConnectionAggregator::select_top(&mut connections, query.top_n);

    let figure = build_figure(&connections);

    let metadata = FigureMetadata {
        generated_at: Utc::now().to_rfc3339(),
        rows_in_window,
        distinct_pairs,
        window_bytes,
        compute_time_seconds: started.elapsed().as_secs_f64(),
    };
    debug!(
        rows = rows_in_window,
        pairs = distinct_pairs,
        shown = connections.len(),
        "figure recomputed"
    );

    FigureUpdate {
        connections,
        figure,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use netflow_core::models::FlowRecord;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn flow(start: &str, subject: &str, peer: &str, total: f64) -> FlowRecord {
        FlowRecord {
            start: Some(ts(start)),
            subject_host_groups: subject.to_string(),
            peer_host_groups: peer.to_string(),
            subject_bytes: 0.0,
            peer_bytes: 0.0,
            total_bytes: total,
        }
    }

    fn query(top_n: usize) -> FigureQuery {
        FigureQuery {
            start: ts("2024-11-01T00:00:00Z"),
            end: ts("2024-11-30T23:59:59Z"),
            top_n,
            mode: NormalizationMode::AfterSum,
        }
    }

    fn table() -> FlowTable {
        FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "Web, DMZ", "DB", 300.0),
            flow("2024-11-25T11:00:00Z", "Web, DMZ", "DB", 200.0),
            flow("2024-11-25T12:00:00Z", "Mail", "DB", 100.0),
            flow("2024-11-26T12:00:00Z", "Mail", "Web", 50.0),
            flow("2024-12-26T12:00:00Z", "Late", "Web", 9999.0),
        ])
    }

    #[test]
    fn test_empty_table_yields_empty_figure() {
        let update = update_figure(&FlowTable::default(), &query(10));
        assert!(update.connections.is_empty());
        assert!(update.figure.is_empty());
        assert_eq!(update.metadata.rows_in_window, 0);
        assert_eq!(update.metadata.distinct_pairs, 0);
    }

    #[test]
    fn test_window_excludes_out_of_range_rows() {
        let update = update_figure(&table(), &query(10));
        assert_eq!(update.metadata.rows_in_window, 4);
        assert_eq!(update.metadata.distinct_pairs, 3);
        assert_eq!(update.metadata.window_bytes, 650.0);
        assert!(update.connections.iter().all(|c| c.subject != "Late"));
    }

    #[test]
    fn test_figure_built_from_top_rows() {
        let update = update_figure(&table(), &query(2));
        assert_eq!(update.connections.len(), 2);
        assert_eq!(update.connections[0].subject, "Web");
        assert_eq!(update.connections[0].total_bytes, 500.0);
        assert_eq!(update.shown_bytes(), 600.0);

        assert_eq!(update.figure.lines.len(), 2);
        let labels: Vec<&str> = update.figure.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["DB", "Mail", "Web"]);
    }

    #[test]
    fn test_top_n_change_reshapes_figure() {
        let small = update_figure(&table(), &query(1));
        let large = update_figure(&table(), &query(3));
        assert_eq!(small.figure.points.len(), 2);
        assert_eq!(large.figure.points.len(), 3);
        assert_eq!(large.figure.lines.len(), 3);
    }

    #[test]
    fn test_blank_host_group_never_becomes_a_node() {
        let mut records = table().records;
        records.push(flow("2024-11-25T19:10:12Z", "", "DB", 2048.0));
        let update = update_figure(&FlowTable::new(records), &query(10));

        assert_eq!(update.metadata.distinct_pairs, 3);
        assert!(update.figure.points.iter().all(|p| !p.label.is_empty()));
        assert_eq!(update.connections[0].subject, "Web");
    }

    #[test]
    fn test_empty_window_yields_empty_figure() {
        let q = FigureQuery {
            start: ts("2023-01-01T00:00:00Z"),
            end: ts("2023-01-02T00:00:00Z"),
            ..query(10)
        };
        let update = update_figure(&table(), &q);
        assert!(update.connections.is_empty());
        assert!(update.figure.is_empty());
    }
}
