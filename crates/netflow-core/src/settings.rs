use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{NetflowError, Result};

/// Slider lower bound.
pub const TOP_N_MIN: u32 = 3;
/// Slider upper bound.
pub const TOP_N_MAX: u32 = 20;
/// Slider starting value.
pub const TOP_N_DEFAULT: u32 = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Host-group connection dashboard for network flow exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "netflow-viz",
    about = "Host-group connection dashboard for network flow exports",
    version
)]
pub struct Settings {
    /// CSV file, directory of CSV files, or http(s) URL
    #[arg(long, env = "NETFLOW_DATA")]
    pub data: Option<String>,

    /// Number of top connections to show (3-20)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(3..=20))]
    pub top_n: u32,

    /// First day or timestamp of the window (defaults to the earliest flow)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day or timestamp of the window (defaults to the latest flow)
    #[arg(long)]
    pub end_date: Option<String>,

    /// View mode
    #[arg(long, default_value = "graph", value_parser = ["graph", "table"])]
    pub view: String,

    /// Merge raw host-group pairs that normalize to the same labels
    #[arg(long)]
    pub merge_normalized: bool,

    /// Write the figure as interactive HTML and exit
    #[arg(long)]
    pub export_html: Option<PathBuf>,

    /// Write the figure as JSON and exit
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Timezone used to display dates (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.netflow-viz/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".netflow-viz").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI and environment always win over persisted values.
        if settings.data.is_none() {
            settings.data = last.data;
        }
        if !is_arg_user_supplied(&matches, "top_n") {
            if let Some(v) = last.top_n.filter(|n| (TOP_N_MIN..=TOP_N_MAX).contains(n)) {
                settings.top_n = v;
            }
        }
        if !is_arg_user_supplied(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_user_supplied(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_user_supplied(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// The configured data source, or a configuration error when none was
    /// given on the command line, in the environment, or in the saved params.
    pub fn require_data(&self) -> Result<&str> {
        self.data.as_deref().ok_or_else(|| {
            NetflowError::Config(
                "no data source; pass --data <PATH|URL> or set NETFLOW_DATA".to_string(),
            )
        })
    }

    /// `true` when the run only writes export files.
    pub fn is_export_only(&self) -> bool {
        self.export_html.is_some() || self.export_json.is_some()
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data: s.data.clone(),
            top_n: Some(s.top_n),
            view: Some(s.view.clone()),
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` came from the command line or the environment
/// rather than a default value.
fn is_arg_user_supplied(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
