//! Top-N host-group connection aggregation over a time window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use netflow_core::models::{normalize_host_group, AggregatedConnection, FlowTable};

// ── NormalizationMode ─────────────────────────────────────────────────────────

/// When host-group labels are reduced to their first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMode {
    /// Sum per raw `(subject, peer)` pair, then normalize the labels.
    ///
    /// Raw pairs that collapse to the same labels stay separate rows.
    #[default]
    AfterSum,
    /// Normalize first so collapsing pairs are summed into one row.
    BeforeSum,
}

impl NormalizationMode {
    pub fn from_merge_flag(merge: bool) -> Self {
        if merge {
            NormalizationMode::BeforeSum
        } else {
            NormalizationMode::AfterSum
        }
    }
}

// ── ConnectionAggregator ──────────────────────────────────────────────────────

/// Stateless helper that groups flows by host-group pair.
pub struct ConnectionAggregator;

impl ConnectionAggregator {
    /// The `top_n` heaviest host-group connections among flows that started
    /// within `[start, end]` (inclusive).
    ///
    /// Rows come back sorted by descending `total_bytes`; ties keep the
    /// ascending order of the grouping key. Never returns more than
    /// `min(top_n, distinct pairs)` rows.
    pub fn aggregate_top_connections(
        table: &FlowTable,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        top_n: usize,
        mode: NormalizationMode,
    ) -> Vec<AggregatedConnection> {
        let mut connections = Self::aggregate_window(table, start, end, mode);
        Self::select_top(&mut connections, top_n);
        connections
    }

    /// Every connection in the window, in grouping-key order.
    pub fn aggregate_window(
        table: &FlowTable,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: NormalizationMode,
    ) -> Vec<AggregatedConnection> {
        // BTreeMap keeps group-by output ordered by key.
        let mut raw: BTreeMap<(String, String), AggregatedConnection> = BTreeMap::new();
        for record in table.filter_by_time(start, end) {
            // Rows without both endpoints cannot form a connection.
            if record.subject_host_groups.trim().is_empty()
                || record.peer_host_groups.trim().is_empty()
            {
                continue;
            }
            let key = (
                record.subject_host_groups.clone(),
                record.peer_host_groups.clone(),
            );
            raw.entry(key)
                .or_insert_with_key(|(s, p)| AggregatedConnection::new(s.clone(), p.clone()))
                .add_record(record);
        }

        let normalized = raw.into_values().map(|mut conn| {
            conn.subject = normalize_host_group(&conn.subject);
            conn.peer = normalize_host_group(&conn.peer);
            conn
        });

        match mode {
            NormalizationMode::AfterSum => normalized.collect(),
            NormalizationMode::BeforeSum => {
                let mut merged: BTreeMap<(String, String), AggregatedConnection> = BTreeMap::new();
                for conn in normalized {
                    merged
                        .entry((conn.subject.clone(), conn.peer.clone()))
                        .and_modify(|existing| existing.merge(&conn))
                        .or_insert(conn);
                }
                merged.into_values().collect()
            }
        }
    }

    /// Keep the `top_n` largest rows by `total_bytes`, stable on ties.
    pub fn select_top(connections: &mut Vec<AggregatedConnection>, top_n: usize) {
        connections.sort_by(|a, b| b.total_bytes.total_cmp(&a.total_bytes));
        connections.truncate(top_n);
    }

    /// Sum of `total_bytes` over `connections`.
    pub fn total_bytes(connections: &[AggregatedConnection]) -> f64 {
        connections.iter().map(|c| c.total_bytes).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use netflow_core::models::FlowRecord;

    const MIB: f64 = 1024.0 * 1024.0;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn flow(start: &str, subject: &str, peer: &str, total: f64) -> FlowRecord {
        FlowRecord {
            start: Some(ts(start)),
            subject_host_groups: subject.to_string(),
            peer_host_groups: peer.to_string(),
            subject_bytes: total / 2.0,
            peer_bytes: total / 2.0,
            total_bytes: total,
        }
    }

    fn full_range() -> (DateTime<Utc>, DateTime<Utc>) {
        (ts("2000-01-01T00:00:00Z"), ts("2100-01-01T00:00:00Z"))
    }

    fn sample_table() -> FlowTable {
        FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "A, X", "B, Y", 10.0),
            flow("2024-11-25T11:00:00Z", "C", "D", 40.0),
            flow("2024-11-25T12:00:00Z", "E", "F", 25.0),
            flow("2024-11-26T09:00:00Z", "A, X", "B, Y", 20.0),
            flow("2024-11-27T09:00:00Z", "G", "H", 5.0),
        ])
    }

    #[test]
    fn test_merges_same_raw_pair_and_normalizes() {
        let table = FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "A,X", "B,Y", 10.0 * MIB),
            flow("2024-11-25T11:00:00Z", "A,X", "B,Y", 5.0 * MIB),
        ]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            5,
            NormalizationMode::AfterSum,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject, "A");
        assert_eq!(rows[0].peer, "B");
        assert_eq!(rows[0].total_bytes, 15.0 * MIB);
        assert_eq!(rows[0].flow_count, 2);
    }

    #[test]
    fn test_sorted_descending_and_truncated() {
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &sample_table(),
            start,
            end,
            3,
            NormalizationMode::AfterSum,
        );
        let totals: Vec<f64> = rows.iter().map(|r| r.total_bytes).collect();
        assert_eq!(totals, vec![40.0, 30.0, 25.0]);
        assert!(rows.windows(2).all(|w| w[0].total_bytes >= w[1].total_bytes));
    }

    #[test]
    fn test_top_n_larger_than_pairs_returns_all() {
        let (start, end) = full_range();
        let table = sample_table();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            50,
            NormalizationMode::AfterSum,
        );
        assert_eq!(rows.len(), 4);
        let input_total: f64 = table.records.iter().map(|r| r.total_bytes).sum();
        assert_eq!(ConnectionAggregator::total_bytes(&rows), input_total);
    }

    #[test]
    fn test_result_total_never_exceeds_input() {
        let (start, end) = full_range();
        let table = sample_table();
        let input_total: f64 = table.records.iter().map(|r| r.total_bytes).sum();
        for n in 0..6 {
            let rows = ConnectionAggregator::aggregate_top_connections(
                &table,
                start,
                end,
                n,
                NormalizationMode::AfterSum,
            );
            assert!(rows.len() <= n.min(4));
            assert!(ConnectionAggregator::total_bytes(&rows) <= input_total);
        }
    }

    #[test]
    fn test_date_window_inclusive() {
        let rows = ConnectionAggregator::aggregate_top_connections(
            &sample_table(),
            ts("2024-11-25T11:00:00Z"),
            ts("2024-11-26T09:00:00Z"),
            10,
            NormalizationMode::AfterSum,
        );
        let totals: Vec<f64> = rows.iter().map(|r| r.total_bytes).collect();
        assert_eq!(totals, vec![40.0, 25.0, 20.0]);
    }

    #[test]
    fn test_empty_window_returns_empty() {
        let rows = ConnectionAggregator::aggregate_top_connections(
            &sample_table(),
            ts("2030-01-01T00:00:00Z"),
            ts("2030-01-02T00:00:00Z"),
            10,
            NormalizationMode::AfterSum,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_undated_rows_are_excluded() {
        let mut undated = flow("2024-11-25T10:00:00Z", "Z", "Z", 999.0);
        undated.start = None;
        let table = FlowTable::new(vec![undated]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_window(
            &table,
            start,
            end,
            NormalizationMode::AfterSum,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_blank_host_groups_are_skipped() {
        let table = FlowTable::new(vec![
            flow("2024-11-25T19:10:12Z", "", "B", 2048.0),
            flow("2024-11-25T19:11:00Z", "A", "  ", 512.0),
            flow("2024-11-25T19:12:00Z", "A", "B", 100.0),
        ]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            10,
            NormalizationMode::BeforeSum,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].subject.as_str(), rows[0].peer.as_str()), ("A", "B"));
        assert_eq!(rows[0].total_bytes, 100.0);
    }

    #[test]
    fn test_after_sum_keeps_collapsing_pairs_separate() {
        let table = FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "A, Atlanta", "B", 10.0),
            flow("2024-11-25T10:00:00Z", "A, Sales", "B", 7.0),
        ]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            10,
            NormalizationMode::AfterSum,
        );
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.subject == "A" && r.peer == "B"));
    }

    #[test]
    fn test_before_sum_merges_collapsing_pairs() {
        let table = FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "A, Atlanta", "B", 10.0),
            flow("2024-11-25T10:00:00Z", "A, Sales", "B", 7.0),
        ]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            10,
            NormalizationMode::BeforeSum,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_bytes, 17.0);
        assert_eq!(rows[0].flow_count, 2);
    }

    #[test]
    fn test_ties_keep_key_order() {
        let table = FlowTable::new(vec![
            flow("2024-11-25T10:00:00Z", "Zulu", "B", 5.0),
            flow("2024-11-25T10:00:00Z", "Alpha", "B", 5.0),
            flow("2024-11-25T10:00:00Z", "Mike", "B", 5.0),
        ]);
        let (start, end) = full_range();
        let rows = ConnectionAggregator::aggregate_top_connections(
            &table,
            start,
            end,
            2,
            NormalizationMode::AfterSum,
        );
        let subjects: Vec<&str> = rows.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Alpha", "Mike"]);
    }

    #[test]
    fn test_mode_from_merge_flag() {
        assert_eq!(
            NormalizationMode::from_merge_flag(true),
            NormalizationMode::BeforeSum
        );
        assert_eq!(
            NormalizationMode::from_merge_flag(false),
            NormalizationMode::AfterSum
        );
    }
}
