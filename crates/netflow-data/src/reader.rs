//! CSV discovery and loading for netflow-viz.
//!
//! Reads flow exports from a local file, a directory of exports, or an
//! http(s) URL and converts every row into a [`FlowRecord`] with numeric byte
//! counters.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use netflow_core::byte_units::ByteUnitParser;
use netflow_core::error::{NetflowError, Result};
use netflow_core::models::{
    FlowRecord, FlowTable, COL_PEER_BYTES, COL_PEER_HOST_GROUPS, COL_START, COL_SUBJECT_BYTES,
    COL_SUBJECT_HOST_GROUPS, COL_TOTAL_BYTES,
};
use netflow_core::time_utils::TimezoneHandler;
use tracing::{debug, info, warn};

/// Timeout applied to remote CSV downloads.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

// ── DataSource ────────────────────────────────────────────────────────────────

/// Where the flow export lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A CSV file or a directory searched recursively for `*.csv`.
    Path(PathBuf),
    /// An http(s) URL serving CSV.
    Url(String),
}

impl DataSource {
    /// Classify a user-supplied location.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => write!(f, "{}", u),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the dataset behind `source`.
///
/// Naive timestamps in the `Start` column are interpreted with `timestamps`.
pub async fn load_dataset(source: &DataSource, timestamps: &TimezoneHandler) -> Result<FlowTable> {
    let records = match source {
        DataSource::Url(url) => {
            let body = fetch_csv(url).await?;
            read_flows(body.as_bytes(), timestamps)?
        }
        DataSource::Path(path) if path.is_dir() => load_csv_dir(path, timestamps)?,
        DataSource::Path(path) => load_csv_file(path, timestamps)?,
    };

    let undated = records.iter().filter(|r| r.start.is_none()).count();
    if undated > 0 {
        warn!("{} rows have an unparseable Start timestamp", undated);
    }
    info!("Loaded {} flow records from {}", records.len(), source);

    Ok(FlowTable::new(records))
}

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load a single CSV export.
pub fn load_csv_file(path: &Path, timestamps: &TimezoneHandler) -> Result<Vec<FlowRecord>> {
    let file = std::fs::File::open(path).map_err(|source| NetflowError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_flows(file, timestamps)?;
    debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Load and concatenate every CSV export under `dir`.
///
/// Files that fail to load are skipped with a warning.
pub fn load_csv_dir(dir: &Path, timestamps: &TimezoneHandler) -> Result<Vec<FlowRecord>> {
    let files = find_csv_files(dir);
    if files.is_empty() {
        return Err(NetflowError::NoDataFiles(dir.to_path_buf()));
    }

    let mut all_records = Vec::new();
    for file_path in &files {
        match load_csv_file(file_path, timestamps) {
            Ok(records) => all_records.extend(records),
            Err(e) => warn!("Skipping {}: {}", file_path.display(), e),
        }
    }

    debug!(
        "Processed {} rows from {} files",
        all_records.len(),
        files.len()
    );
    Ok(all_records)
}

/// Parse flow rows from any CSV reader.
///
/// Byte cells go through [`ByteUnitParser`]; a garbled cell becomes `0.0`
/// and the row is kept. Short rows are accepted and their missing cells
/// treated as absent values.
pub fn read_flows<R: Read>(reader: R, timestamps: &TimezoneHandler) -> Result<Vec<FlowRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(columns.to_record(&row, timestamps));
    }
    Ok(records)
}

/// Download a CSV export over http(s).
pub async fn fetch_csv(url: &str) -> Result<String> {
    let fetch_err = |message: String| NetflowError::Fetch {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("netflow-viz/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| fetch_err(e.to_string()))?;

    info!("Fetching flow export from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("HTTP {}", status)));
    }

    response.text().await.map_err(|e| fetch_err(e.to_string()))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Positions of the required columns within a CSV header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    start: usize,
    subject_host_groups: usize,
    peer_host_groups: usize,
    subject_bytes: usize,
    peer_bytes: usize,
    total_bytes: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| NetflowError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            start: find(COL_START)?,
            subject_host_groups: find(COL_SUBJECT_HOST_GROUPS)?,
            peer_host_groups: find(COL_PEER_HOST_GROUPS)?,
            subject_bytes: find(COL_SUBJECT_BYTES)?,
            peer_bytes: find(COL_PEER_BYTES)?,
            total_bytes: find(COL_TOTAL_BYTES)?,
        })
    }

    fn to_record(&self, row: &csv::StringRecord, timestamps: &TimezoneHandler) -> FlowRecord {
        let start = row.get(self.start).and_then(|s| {
            let parsed = timestamps.parse_timestamp(s);
            if parsed.is_none() {
                debug!("Unparseable Start value \"{}\"", s);
            }
            parsed
        });

        FlowRecord {
            start,
            subject_host_groups: row.get(self.subject_host_groups).unwrap_or_default().to_string(),
            peer_host_groups: row.get(self.peer_host_groups).unwrap_or_default().to_string(),
            subject_bytes: ByteUnitParser::parse(row.get(self.subject_bytes)),
            peer_bytes: ByteUnitParser::parse(row.get(self.peer_bytes)),
            total_bytes: ByteUnitParser::parse(row.get(self.total_bytes)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "Start,Subject Host Groups,Peer Host Groups,Subject Bytes,Peer Bytes,Total Bytes";

    fn sample_csv() -> String {
        format!(
            "{HEADER}\n\
             2024-11-25T19:10:12.000+0000,\"End User Devices, Atlanta\",\"Atlanta, Protected\",100.5 M,68.17 M,168.67 M\n\
             2024-11-25T19:10:44.000+0000,\"End User Devices, Sales\",\"Casablanca, QA\",--,118.86 M,118.86 M\n"
        )
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    // ── DataSource ────────────────────────────────────────────────────────────

    #[test]
    fn test_data_source_classifies_urls() {
        assert_eq!(
            DataSource::parse("https://example.com/netflow-large.csv"),
            DataSource::Url("https://example.com/netflow-large.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("HTTP://example.com/a.csv"),
            DataSource::Url("HTTP://example.com/a.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("./flows.csv"),
            DataSource::Path(PathBuf::from("./flows.csv"))
        );
    }

    // ── read_flows ────────────────────────────────────────────────────────────

    #[test]
    fn test_read_flows_converts_columns() {
        let records = read_flows(sample_csv().as_bytes(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.start,
            Some(Utc.with_ymd_and_hms(2024, 11, 25, 19, 10, 12).unwrap())
        );
        assert_eq!(first.subject_host_groups, "End User Devices, Atlanta");
        assert_eq!(first.peer_host_groups, "Atlanta, Protected");
        assert!((first.total_bytes - 168.67 * 1024.0 * 1024.0).abs() < 1e-3);
        assert!((first.subject_bytes - 100.5 * 1024.0 * 1024.0).abs() < 1e-3);

        assert_eq!(records[1].subject_bytes, 0.0);
    }

    #[test]
    fn test_read_flows_keeps_garbled_rows() {
        let csv = format!("{HEADER}\n2024-11-25T19:10:12Z,A,B,oops,1K,not-a-number\n");
        let records = read_flows(csv.as_bytes(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_bytes, 0.0);
        assert_eq!(records[0].peer_bytes, 1024.0);
        assert_eq!(records[0].total_bytes, 0.0);
    }

    #[test]
    fn test_read_flows_short_row_treated_as_missing() {
        let csv = format!("{HEADER}\n2024-11-25T19:10:12Z,A,B,1K\n");
        let records = read_flows(csv.as_bytes(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject_bytes, 1024.0);
        assert_eq!(records[0].peer_bytes, 0.0);
        assert_eq!(records[0].total_bytes, 0.0);
    }

    #[test]
    fn test_read_flows_unparseable_start_is_none() {
        let csv = format!("{HEADER}\nsometime,A,B,1,1,2\n");
        let records = read_flows(csv.as_bytes(), &TimezoneHandler::utc()).unwrap();
        assert!(records[0].start.is_none());
        assert_eq!(records[0].total_bytes, 2.0);
    }

    #[test]
    fn test_read_flows_extra_columns_and_order() {
        let csv = "Total Bytes,Flow ID,Peer Bytes,Subject Bytes,Peer Host Groups,Subject Host Groups,Start\n\
                   2K,17,1K,1K,B,A,2024-11-25\n";
        let records = read_flows(csv.as_bytes(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(records[0].total_bytes, 2048.0);
        assert_eq!(records[0].subject_host_groups, "A");
        assert_eq!(records[0].peer_host_groups, "B");
    }

    #[test]
    fn test_read_flows_missing_column_is_error() {
        let csv = "Start,Subject Host Groups,Peer Host Groups,Subject Bytes,Peer Bytes\n";
        let err = read_flows(csv.as_bytes(), &TimezoneHandler::utc()).unwrap_err();
        match err {
            NetflowError::MissingColumn(name) => assert_eq!(name, "Total Bytes"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // ── files and directories ─────────────────────────────────────────────────

    #[test]
    fn test_load_csv_file_missing_is_file_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_csv_file(&tmp.path().join("absent.csv"), &TimezoneHandler::utc())
            .unwrap_err();
        assert!(matches!(err, NetflowError::FileRead { .. }));
    }

    #[test]
    fn test_find_csv_files_recursive_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        write_file(tmp.path(), "b.csv", &sample_csv());
        write_file(&tmp.path().join("nested"), "a.CSV", &sample_csv());
        write_file(tmp.path(), "notes.txt", "ignore me");

        let files = find_csv_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_load_csv_dir_concatenates_and_skips_bad_files() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "day1.csv", &sample_csv());
        write_file(tmp.path(), "day2.csv", &sample_csv());
        write_file(tmp.path(), "broken.csv", "Start,Whatever\n1,2\n");

        let records = load_csv_dir(tmp.path(), &TimezoneHandler::utc()).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_load_csv_dir_empty_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_csv_dir(tmp.path(), &TimezoneHandler::utc()).unwrap_err();
        assert!(matches!(err, NetflowError::NoDataFiles(_)));
    }

    #[tokio::test]
    async fn test_load_dataset_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "flows.csv", &sample_csv());

        let table = load_dataset(&DataSource::Path(path), &TimezoneHandler::utc())
            .await
            .unwrap();
        assert_eq!(table.len(), 2);
        let (lo, hi) = table.time_bounds().unwrap();
        assert!(lo < hi);
    }

    #[tokio::test]
    async fn test_load_dataset_from_directory() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "flows.csv", &sample_csv());

        let table = load_dataset(
            &DataSource::Path(tmp.path().to_path_buf()),
            &TimezoneHandler::utc(),
        )
        .await
        .unwrap();
        assert_eq!(table.len(), 2);
    }
}
