//! Circular bubble/edge layout for aggregated host-group connections.
//!
//! Every distinct host group becomes a bubble on the unit circle; every
//! connection becomes a line between its two bubbles. The result is a
//! renderer-agnostic [`RenderSpec`] consumed by both the terminal canvas and
//! the HTML export.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::models::AggregatedConnection;

/// Radius of the layout circle.
pub const LAYOUT_RADIUS: f64 = 1.0;

// ── Primitives ────────────────────────────────────────────────────────────────

/// Position of a bubble on the layout circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubblePosition {
    pub x: f64,
    pub y: f64,
}

/// One host-group bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPrimitive {
    pub label: String,
    pub position: BubblePosition,
    /// `2 * ln(volume + 1)`.
    pub size: f64,
    /// Bytes summed over every connection touching this group.
    pub volume: f64,
}

/// One connection edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePrimitive {
    pub subject: String,
    pub peer: String,
    pub from: BubblePosition,
    pub to: BubblePosition,
    /// `ln(total_bytes + 1)`.
    pub weight: f64,
    pub total_bytes: f64,
    pub hover_text: String,
}

/// Either kind of drawable, in draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive<'a> {
    Line(&'a LinePrimitive),
    Point(&'a PointPrimitive),
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub lines: Vec<LinePrimitive>,
    pub points: Vec<PointPrimitive>,
}

impl RenderSpec {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty()
    }

    /// All primitives in draw order: lines beneath points.
    pub fn primitives(&self) -> impl Iterator<Item = Primitive<'_>> {
        self.lines
            .iter()
            .map(Primitive::Line)
            .chain(self.points.iter().map(Primitive::Point))
    }

    /// Largest bubble size, `0.0` for an empty figure.
    pub fn max_point_size(&self) -> f64 {
        self.points.iter().map(|p| p.size).fold(0.0, f64::max)
    }

    /// Largest line weight, `0.0` for an empty figure.
    pub fn max_line_weight(&self) -> f64 {
        self.lines.iter().map(|l| l.weight).fold(0.0, f64::max)
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

/// Distinct host groups appearing on either side of `connections`, in
/// ascending lexicographic order so the layout is reproducible.
pub fn distinct_groups(connections: &[AggregatedConnection]) -> Vec<String> {
    connections
        .iter()
        .flat_map(|c| [c.subject.as_str(), c.peer.as_str()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Spread `labels` evenly around the unit circle.
///
/// Label `i` of `n` sits at angle `2π·i/n`. An empty slice yields an empty map.
pub fn circle_positions(labels: &[String]) -> BTreeMap<String, BubblePosition> {
    let count = labels.len();
    if count == 0 {
        return BTreeMap::new();
    }
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            let pos = BubblePosition {
                x: LAYOUT_RADIUS * angle.cos(),
                y: LAYOUT_RADIUS * angle.sin(),
            };
            (label.clone(), pos)
        })
        .collect()
}

/// Bubble size for a group that moved `volume` bytes.
pub fn bubble_size(volume: f64) -> f64 {
    2.0 * volume.ln_1p()
}

/// Line weight for a connection of `total_bytes`.
pub fn line_weight(total_bytes: f64) -> f64 {
    total_bytes.ln_1p()
}

/// Hover label attached to a connection line.
pub fn hover_label(subject: &str, peer: &str, total_bytes: f64) -> String {
    format!("{} -> {}\nBytes: {:.2}", subject, peer, total_bytes)
}

/// Build the bubble/edge figure for `connections`.
///
/// An empty input produces an empty [`RenderSpec`].
pub fn build_figure(connections: &[AggregatedConnection]) -> RenderSpec {
    let groups = distinct_groups(connections);
    let positions = circle_positions(&groups);
    if positions.is_empty() {
        return RenderSpec::default();
    }

    let lines = connections
        .iter()
        .filter_map(|conn| {
            let from = *positions.get(&conn.subject)?;
            let to = *positions.get(&conn.peer)?;
            Some(LinePrimitive {
                subject: conn.subject.clone(),
                peer: conn.peer.clone(),
                from,
                to,
                weight: line_weight(conn.total_bytes),
                total_bytes: conn.total_bytes,
                hover_text: hover_label(&conn.subject, &conn.peer, conn.total_bytes),
            })
        })
        .collect();

    // Volume is re-scanned from the rows, one pass per group.
    let points = groups
        .iter()
        .map(|group| {
            let volume: f64 = connections
                .iter()
                .filter(|c| c.involves(group))
                .map(|c| c.total_bytes)
                .sum();
            PointPrimitive {
                label: group.clone(),
                position: positions[group],
                size: bubble_size(volume),
                volume,
            }
        })
        .collect();

    RenderSpec { lines, points }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(subject: &str, peer: &str, total: f64) -> AggregatedConnection {
        AggregatedConnection {
            total_bytes: total,
            ..AggregatedConnection::new(subject, peer)
        }
    }

    #[test]
    fn test_empty_connections_give_empty_figure() {
        let spec = build_figure(&[]);
        assert!(spec.is_empty());
        assert_eq!(spec.primitives().count(), 0);
        assert_eq!(spec.max_point_size(), 0.0);
    }

    #[test]
    fn test_angles_evenly_spaced_on_unit_circle() {
        let labels: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        let positions = circle_positions(&labels);
        assert_eq!(positions.len(), 5);
        for (k, label) in labels.iter().enumerate() {
            let pos = positions[label];
            let angle = 2.0 * PI * k as f64 / 5.0;
            assert!((pos.x - angle.cos()).abs() < 1e-12);
            assert!((pos.y - angle.sin()).abs() < 1e-12);
            assert!((pos.x * pos.x + pos.y * pos.y - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_group_sits_at_angle_zero() {
        let spec = build_figure(&[conn("A", "A", 100.0)]);
        assert_eq!(spec.points.len(), 1);
        assert_eq!(spec.points[0].position, BubblePosition { x: 1.0, y: 0.0 });
        assert_eq!(spec.lines.len(), 1);
    }

    #[test]
    fn test_every_group_gets_exactly_one_point() {
        let conns = vec![conn("A", "B", 10.0), conn("B", "C", 5.0), conn("A", "C", 1.0)];
        let spec = build_figure(&conns);
        let labels: Vec<&str> = spec.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(spec.lines.len(), 3);
    }

    #[test]
    fn test_bubble_size_uses_rescanned_volume() {
        let conns = vec![conn("A", "B", 10.0), conn("C", "A", 5.0)];
        let spec = build_figure(&conns);
        let a = spec.points.iter().find(|p| p.label == "A").unwrap();
        assert_eq!(a.volume, 15.0);
        assert!((a.size - 2.0 * 16.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_bubble_size_monotonic() {
        let mut last = bubble_size(0.0);
        assert_eq!(last, 0.0);
        for v in [1.0, 10.0, 1024.0, 1e6, 1e12] {
            let size = bubble_size(v);
            assert!(size > last);
            last = size;
        }
    }

    #[test]
    fn test_line_weight_and_hover() {
        let spec = build_figure(&[conn("A", "B", 1234.5)]);
        let line = &spec.lines[0];
        assert!((line.weight - 1235.5_f64.ln()).abs() < 1e-12);
        assert_eq!(line.hover_text, "A -> B\nBytes: 1234.50");
        assert_eq!(line.from, spec.points[0].position);
        assert_eq!(line.to, spec.points[1].position);
    }

    #[test]
    fn test_primitives_emit_lines_before_points() {
        let spec = build_figure(&[conn("A", "B", 1.0), conn("B", "C", 2.0)]);
        let kinds: Vec<bool> = spec
            .primitives()
            .map(|p| matches!(p, Primitive::Line(_)))
            .collect();
        assert_eq!(kinds, vec![true, true, false, false, false]);
    }

    #[test]
    fn test_duplicate_labels_keep_separate_lines() {
        let spec = build_figure(&[conn("A", "B", 1.0), conn("A", "B", 2.0)]);
        assert_eq!(spec.points.len(), 2);
        assert_eq!(spec.lines.len(), 2);
        assert_eq!(spec.points[0].volume, 3.0);
    }

    #[test]
    fn test_render_spec_serializes() {
        let spec = build_figure(&[conn("A", "B", 1.0)]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["lines"][0]["subject"], "A");
        assert_eq!(json["points"].as_array().unwrap().len(), 2);
    }
}
