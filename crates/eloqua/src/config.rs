//! Configuration loading for the Eloqua tap
//!
//! Supports loading the tap config from (in order of priority):
//! 1. An explicit JSON file (the `--config` argument)
//! 2. `config.json` in the tap config directory
//! 3. Runtime environment variables (fallback)

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::{StreamKind, parse_timestamp};

/// Config filename in the tap config directory
const CONFIG_FILE: &str = "config.json";

/// Largest page the Bulk API serves from a sync's data endpoint
const MAX_PAGE_SIZE: usize = 50_000;

/// Upper bound on `min_window_secs` (one year)
const MAX_MIN_WINDOW_SECS: u64 = 365 * 86_400;

/// Tunables for the export engine.
///
/// Every limit and delay the engine uses lives here so tests can shrink
/// them (tiny export limits, zero delays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Dataset size ceiling for a single export; at or above it the window is split
    pub export_limit: u64,
    /// Records requested per data page
    pub page_size: usize,
    /// Delay between sync status checks
    pub poll_interval_secs: u64,
    /// Status checks per sync before giving up
    pub max_poll_attempts: u32,
    /// New syncs created for one export definition after failures
    pub max_sync_retries: u32,
    /// Minimum gap between consecutive HTTP requests
    pub request_delay_ms: u64,
    /// Transport-level timeout for a single HTTP call
    pub request_timeout_secs: u64,
    /// Windows this short that still hit the ceiling are fatal
    pub min_window_secs: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            export_limit: 5_000_000,
            page_size: 50_000,
            poll_interval_secs: 30,
            max_poll_attempts: 20,
            max_sync_retries: 3,
            request_delay_ms: 150,
            request_timeout_secs: 300,
            min_window_secs: 1,
        }
    }
}

impl ExportSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn min_window(&self) -> chrono::TimeDelta {
        i64::try_from(self.min_window_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.export_limit == 0 {
            bail!("export_limit must be greater than zero");
        }
        if self.page_size == 0 {
            bail!("page_size must be greater than zero");
        }
        if self.page_size > MAX_PAGE_SIZE {
            bail!(
                "page_size {} exceeds the Bulk API maximum of {}",
                self.page_size,
                MAX_PAGE_SIZE
            );
        }
        if self.min_window_secs > MAX_MIN_WINDOW_SECS {
            bail!(
                "min_window_secs {} exceeds the maximum of {}",
                self.min_window_secs,
                MAX_MIN_WINDOW_SECS
            );
        }
        if self.max_poll_attempts == 0 {
            bail!("max_poll_attempts must be greater than zero");
        }
        Ok(())
    }
}

/// Tap configuration as stored in the JSON config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Where extraction starts for streams without a bookmark
    pub start_date: String,
    pub sitename: String,
    pub username: String,
    pub password: String,
    /// Streams to extract; all streams when absent
    #[serde(default)]
    pub streams: Option<Vec<String>>,
    #[serde(default)]
    pub export: ExportSettings,
}

impl TapConfig {
    /// Load config using the following priority:
    /// 1. `path`, when given
    /// 2. JSON file (~/.config/tap-eloqua/config.json)
    /// 3. Runtime environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match config::find_config(path, CONFIG_FILE) {
            Some(file) => Self::from_file(&file)?,
            None => Self::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse tap config JSON")
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).with_context(|| format!("{} environment variable not set", name))
        };

        Ok(Self {
            start_date: var("ELOQUA_START_DATE")?,
            sitename: var("ELOQUA_SITENAME")?,
            username: var("ELOQUA_USERNAME")?,
            password: var("ELOQUA_PASSWORD")?,
            streams: std::env::var("ELOQUA_STREAMS")
                .ok()
                .map(|s| s.split(',').map(|name| name.trim().to_string()).collect()),
            export: ExportSettings::default(),
        })
    }

    /// Check required keys and derived values
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("start_date", &self.start_date),
            ("sitename", &self.sitename),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                bail!("Config is missing required key '{}'", key);
            }
        }

        self.start_timestamp()?;
        self.selected_streams()?;
        self.export.validate().context("Invalid export settings")?;
        Ok(())
    }

    /// Parsed `start_date`
    pub fn start_timestamp(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.start_date)
            .with_context(|| format!("Invalid start_date '{}'", self.start_date))
    }

    /// Streams named in the config, or every stream when none are listed
    pub fn selected_streams(&self) -> Result<Vec<StreamKind>> {
        match &self.streams {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| name.parse::<StreamKind>().map_err(anyhow::Error::from))
                .collect(),
            _ => Ok(StreamKind::ALL.to_vec()),
        }
    }
}
