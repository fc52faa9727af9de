//! Figure export: an interactive plotly HTML page and a JSON snapshot.

use std::fs;
use std::path::Path;

use plotly::{
    common::{HoverInfo, Line, Marker, Mode, Position},
    layout::{Axis, HoverMode},
    Layout, Plot, Scatter,
};
use tracing::info;

use netflow_core::error::Result;
use netflow_core::layout::RenderSpec;
use netflow_data::analysis::{FigureQuery, FigureUpdate};

use crate::components::header::DASHBOARD_TITLE;
use crate::graph_view::FIGURE_TITLE;

const EDGE_COLOR: &str = "rgba(100, 100, 100, 0.5)";
const BUBBLE_COLOR: &str = "rgba(50, 171, 96, 0.7)";
const BUBBLE_BORDER: &str = "rgba(50, 171, 96, 1)";

/// plotly.js only breaks hover labels on `<br>`.
fn plotly_hover_text(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Build the plotly figure for `spec`.
///
/// One line trace per connection, then a single marker+text trace holding
/// every bubble, so bubbles draw over edges.
pub fn build_plot(spec: &RenderSpec) -> Plot {
    let mut plot = Plot::new();

    for line in &spec.lines {
        let hover = plotly_hover_text(&line.hover_text);
        let trace = Scatter::new(vec![line.from.x, line.to.x], vec![line.from.y, line.to.y])
            .mode(Mode::Lines)
            .line(Line::new().color(EDGE_COLOR).width(line.weight))
            .hover_info(HoverInfo::Text)
            .text(hover.as_str())
            .show_legend(false);
        plot.add_trace(trace);
    }

    if !spec.points.is_empty() {
        let xs: Vec<f64> = spec.points.iter().map(|p| p.position.x).collect();
        let ys: Vec<f64> = spec.points.iter().map(|p| p.position.y).collect();
        let labels: Vec<String> = spec.points.iter().map(|p| p.label.clone()).collect();
        let sizes: Vec<usize> = spec
            .points
            .iter()
            .map(|p| p.size.round().max(0.0) as usize)
            .collect();

        let trace = Scatter::new(xs, ys)
            .mode(Mode::MarkersText)
            .text_array(labels)
            .text_position(Position::BottomCenter)
            .hover_info(HoverInfo::Text)
            .marker(
                Marker::new()
                    .size_array(sizes)
                    .color(BUBBLE_COLOR)
                    .line(Line::new().color(BUBBLE_BORDER).width(2.0)),
            )
            .show_legend(false);
        plot.add_trace(trace);
    }

    let hidden_axis = || {
        Axis::new()
            .show_grid(false)
            .zero_line(false)
            .show_tick_labels(false)
    };
    plot.set_layout(
        Layout::new()
            .title(format!("<b>{}</b><br>{}", DASHBOARD_TITLE, FIGURE_TITLE))
            .show_legend(false)
            .hover_mode(HoverMode::Closest)
            .x_axis(hidden_axis())
            .y_axis(hidden_axis()),
    );

    plot
}

/// Write the figure as a standalone HTML page.
pub fn export_html(spec: &RenderSpec, path: &Path) -> Result<()> {
    let html = build_plot(spec).to_html();
    fs::write(path, html)?;
    info!(
        "Exported {} connections to {}",
        spec.lines.len(),
        path.display()
    );
    Ok(())
}

/// Write the query, connection rows, figure and metadata as pretty JSON.
pub fn export_json(query: &FigureQuery, update: &FigureUpdate, path: &Path) -> Result<()> {
    let doc = serde_json::json!({
        "start": query.start.to_rfc3339(),
        "end": query.end.to_rfc3339(),
        "top_n": query.top_n,
        "connections": update.connections,
        "figure": update.figure,
        "metadata": update.metadata,
    });
    let content = serde_json::to_string_pretty(&doc)?;
    fs::write(path, content)?;
    info!("Exported figure JSON to {}", path.display());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
