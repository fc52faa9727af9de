mod bootstrap;

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use netflow_core::models::FlowTable;
use netflow_core::settings::Settings;
use netflow_core::time_utils::TimezoneHandler;
use netflow_data::aggregator::NormalizationMode;
use netflow_data::analysis::{update_figure, FigureQuery, FigureUpdate};
use netflow_data::reader::{load_dataset, DataSource};
use netflow_ui::app::{App, AppOptions, ViewMode};
use netflow_ui::export;

/// Default target of the `e` key in the interactive shell.
const DEFAULT_EXPORT_FILE: &str = "host-group-connections.html";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    // The interactive shell owns the terminal, so its logs go to a file.
    let log_file = settings.log_file.clone().or_else(|| {
        (!settings.is_export_only()).then(bootstrap::default_log_file)
    });
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Netflow Viz v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Top N: {}, View: {}, Theme: {}, Timezone: {}",
        settings.top_n,
        settings.view,
        settings.theme,
        settings.timezone
    );

    let source = DataSource::parse(settings.require_data()?);
    let table = load_dataset(&source, &TimezoneHandler::utc()).await?;

    let display_tz = TimezoneHandler::new(&settings.timezone);
    let window = resolve_window(&settings, &table, &display_tz)?;
    let mode = NormalizationMode::from_merge_flag(settings.merge_normalized);

    if settings.is_export_only() {
        let Some((start, end)) = window else {
            bail!("{} has no flows with a parseable start time", source);
        };
        let query = FigureQuery {
            start,
            end,
            top_n: settings.top_n as usize,
            mode,
        };
        let update = update_figure(&table, &query);
        tracing::info!("{}", export_summary(&update, &display_tz, start, end));

        if let Some(path) = &settings.export_html {
            export::export_html(&update.figure, path)?;
        }
        if let Some(path) = &settings.export_json {
            export::export_json(&query, &update, path)?;
        }
        return Ok(());
    }

    let app = App::new(
        table,
        AppOptions {
            theme: settings.theme.clone(),
            view_mode: ViewMode::from_name(&settings.view),
            source: source.to_string(),
            timezone: settings.timezone.clone(),
            top_n: settings.top_n,
            range: window,
            mode,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
        },
    );

    // The TUI exits on 'q' / Ctrl+C itself; the signal arm covers SIGINT
    // delivered from outside the terminal.
    tokio::select! {
        result = app.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    Ok(())
}

/// Window selected by `--start-date` / `--end-date`, defaulting each side to
/// the dataset bounds.
///
/// Returns `None` when the dataset has no dated flows and no bound was given
/// for the missing side.
fn resolve_window(
    settings: &Settings,
    table: &FlowTable,
    display_tz: &TimezoneHandler,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let start = settings
        .start_date
        .as_deref()
        .map(|s| display_tz.parse_range_bound(s, false))
        .transpose()?;
    let end = settings
        .end_date
        .as_deref()
        .map(|s| display_tz.parse_range_bound(s, true))
        .transpose()?;

    let bounds = table.time_bounds();
    let start = start.or(bounds.map(|(lo, _)| lo));
    let end = end.or(bounds.map(|(_, hi)| hi));

    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            bail!("start date {} is after end date {}", start, end)
        }
        (Some(start), Some(end)) => Ok(Some((start, end))),
        _ => Ok(None),
    }
}

/// One-line description of an export-only run.
fn export_summary(
    update: &FigureUpdate,
    display_tz: &TimezoneHandler,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "{} of {} connections between {} and {}",
        update.connections.len(),
        update.metadata.distinct_pairs,
        display_tz.format_datetime(start),
        display_tz.format_datetime(end)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;
    use netflow_core::models::FlowRecord;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, d, h, 0, 0).unwrap()
    }

    fn table() -> FlowTable {
        let record = |start| FlowRecord {
            start: Some(start),
            subject_host_groups: "A".to_string(),
            peer_host_groups: "B".to_string(),
            subject_bytes: 1.0,
            peer_bytes: 1.0,
            total_bytes: 2.0,
        };
        FlowTable::new(vec![record(at(20, 8)), record(at(28, 17))])
    }

    fn settings(extra: &[&str]) -> Settings {
        let mut args = vec!["netflow-viz", "--data", "flows.csv"];
        args.extend_from_slice(extra);
        Settings::parse_from(args)
    }

    #[test]
    fn test_window_defaults_to_table_bounds() {
        let window = resolve_window(&settings(&[]), &table(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(window, Some((at(20, 8), at(28, 17))));
    }

    #[test]
    fn test_window_end_date_covers_whole_day() {
        let s = settings(&["--start-date", "2024-11-22", "--end-date", "2024-11-25"]);
        let (start, end) = resolve_window(&s, &table(), &TimezoneHandler::utc())
            .unwrap()
            .unwrap();
        assert_eq!(start, at(22, 0));
        assert!(end > at(25, 23) && end < at(26, 0));
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let s = settings(&["--start-date", "2024-11-27", "--end-date", "2024-11-21"]);
        assert!(resolve_window(&s, &table(), &TimezoneHandler::utc()).is_err());
    }

    #[test]
    fn test_window_rejects_garbage_date() {
        let s = settings(&["--start-date", "someday"]);
        assert!(resolve_window(&s, &table(), &TimezoneHandler::utc()).is_err());
    }

    #[test]
    fn test_window_none_without_dated_flows() {
        let window =
            resolve_window(&settings(&[]), &FlowTable::default(), &TimezoneHandler::utc())
                .unwrap();
        assert!(window.is_none());
    }

    #[test]
    fn test_export_summary_uses_display_timezone() {
        let query = FigureQuery {
            start: at(20, 0),
            end: at(28, 23),
            top_n: 10,
            mode: NormalizationMode::AfterSum,
        };
        let update = update_figure(&table(), &query);
        let summary = export_summary(
            &update,
            &TimezoneHandler::new("America/New_York"),
            query.start,
            query.end,
        );
        assert_eq!(
            summary,
            "1 of 1 connections between 2024-11-19 19:00:00 and 2024-11-28 18:00:00"
        );
    }
}
