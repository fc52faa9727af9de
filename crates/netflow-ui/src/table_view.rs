//! Top-connections table for the netflow TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per host-group
//! connection plus a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use netflow_core::formatting;
use netflow_core::models::AggregatedConnection;

use crate::themes::Theme;

/// Aggregated totals across all rows in the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableTotals {
    pub subject_bytes: f64,
    pub peer_bytes: f64,
    pub total_bytes: f64,
    pub flow_count: u64,
    /// Bytes moved by every connection in the window, shown or not.
    pub window_bytes: f64,
    pub rows: usize,
}

impl TableTotals {
    pub fn from_connections(connections: &[AggregatedConnection], window_bytes: f64) -> Self {
        Self {
            subject_bytes: connections.iter().map(|c| c.subject_bytes).sum(),
            peer_bytes: connections.iter().map(|c| c.peer_bytes).sum(),
            total_bytes: connections.iter().map(|c| c.total_bytes).sum(),
            flow_count: connections.iter().map(|c| c.flow_count as u64).sum(),
            window_bytes,
            rows: connections.len(),
        }
    }
}

/// Render the connections table into `area`.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    connections: &[AggregatedConnection],
    totals: &TableTotals,
    theme: &Theme,
) {
    let header_cells = [
        "#", "Subject", "Peer", "Flows", "Subject", "Peer", "Total", "Share",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = connections
        .iter()
        .enumerate()
        .map(|(i, conn)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let share = formatting::percentage(conn.total_bytes, totals.window_bytes, 1);
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(conn.subject.clone()),
                Cell::from(conn.peer.clone()),
                Cell::from(formatting::format_number(conn.flow_count as f64, 0)),
                Cell::from(formatting::format_bytes(conn.subject_bytes)),
                Cell::from(formatting::format_bytes(conn.peer_bytes)),
                Cell::from(formatting::format_bytes(conn.total_bytes)),
                Cell::from(format!("{:.1}%", share)),
            ])
            .style(style)
        })
        .collect();

    let shown_share = formatting::percentage(totals.total_bytes, totals.window_bytes, 1);
    let total_row = Row::new(vec![
        Cell::from("TOTAL").style(theme.table_total),
        Cell::from(format!("{} connections", totals.rows)),
        Cell::from(""),
        Cell::from(formatting::format_number(totals.flow_count as f64, 0)),
        Cell::from(formatting::format_bytes(totals.subject_bytes)),
        Cell::from(formatting::format_bytes(totals.peer_bytes)),
        Cell::from(formatting::format_bytes(totals.total_bytes)),
        Cell::from(format!("{:.1}%", shown_share)),
    ])
    .style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Length(4),
        Constraint::Min(18),
        Constraint::Min(18),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(7),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when the dataset has no dated flows at all.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No flow data found", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check that the source has a parseable Start column.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Netflow Viz "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
