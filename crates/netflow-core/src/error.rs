use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by netflow-viz.
#[derive(Error, Debug)]
pub enum NetflowError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A column required by the loader is absent from the CSV header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A remote CSV resource could not be downloaded.
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A human-readable byte string could not be converted.
    #[error("Could not convert '{0}' to numeric value")]
    ByteParse(String),

    /// The data source holds no CSV files.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be produced or parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the netflow crates.
pub type Result<T> = std::result::Result<T, NetflowError>;
