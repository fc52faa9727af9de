//! Circular host-group graph drawn on a braille [`Canvas`].
//!
//! Consumes the renderer-agnostic [`RenderSpec`]: edges are drawn first so
//! bubbles and labels sit on top of them.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders,
    },
    Frame,
};
use unicode_width::UnicodeWidthChar;

use netflow_core::layout::{Primitive, RenderSpec, LAYOUT_RADIUS};

use crate::themes::Theme;

/// Figure title shown on the graph block.
pub const FIGURE_TITLE: &str = "Host Group Connections";

/// Longest label, in terminal columns, printed next to a bubble.
pub const MAX_LABEL_WIDTH: usize = 20;

const BOUND: f64 = LAYOUT_RADIUS * 1.35;
const MIN_RADIUS: f64 = 0.03;
const MAX_RADIUS: f64 = 0.16;

/// Cut `label` to at most `max_width` columns, ending with `…` when cut.
pub fn truncate_label(label: &str, max_width: usize) -> String {
    let total: usize = label.chars().filter_map(|c| c.width()).sum();
    if total <= max_width {
        return label.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in label.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Canvas radius for a bubble of `size` relative to the largest bubble.
pub fn bubble_radius(size: f64, max_size: f64) -> f64 {
    if max_size <= 0.0 {
        return MIN_RADIUS;
    }
    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * (size / max_size).clamp(0.0, 1.0)
}

/// Render `spec` into `area`, or a placeholder when it is empty.
pub fn render_graph_view(frame: &mut Frame, area: Rect, spec: &RenderSpec, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(format!(" {} ", FIGURE_TITLE), theme.header));

    let max_size = spec.max_point_size();
    let max_weight = spec.max_line_weight();
    let node_color = theme.node.fg.unwrap_or(Color::Green);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-BOUND, BOUND])
        .y_bounds([-BOUND, BOUND])
        .paint(move |ctx| {
            if spec.is_empty() {
                ctx.print(
                    -0.45,
                    0.0,
                    Span::styled(
                        "No connections in the selected range",
                        theme.dim.add_modifier(Modifier::ITALIC),
                    ),
                );
                return;
            }

            for primitive in spec.primitives() {
                match primitive {
                    Primitive::Line(line) => {
                        let style = theme.edge_style(line.weight, max_weight);
                        ctx.draw(&CanvasLine {
                            x1: line.from.x,
                            y1: line.from.y,
                            x2: line.to.x,
                            y2: line.to.y,
                            color: style.fg.unwrap_or(Color::Gray),
                        });
                    }
                    Primitive::Point(point) => {
                        ctx.draw(&Circle {
                            x: point.position.x,
                            y: point.position.y,
                            radius: bubble_radius(point.size, max_size),
                            color: node_color,
                        });
                    }
                }
            }

            ctx.layer();
            for point in &spec.points {
                let label = truncate_label(&point.label, MAX_LABEL_WIDTH);
                let radius = bubble_radius(point.size, max_size);
                // Bottom centre, like the exported figure.
                let y = point.position.y - radius - 0.08;
                ctx.print(point.position.x - radius, y, Span::styled(label, theme.node_label));
            }
        });

    frame.render_widget(canvas, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
