use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "dashboard.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Initial value of the date-range filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRangeDefault {
    /// Earliest to latest date in the data.
    #[default]
    FullSpan,
    /// No date filter until the user enables one.
    Unset,
}

/// Startup settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV loaded on startup.
    pub data_path: PathBuf,
    pub date_range_default: DateRangeDefault,
    /// Bin count of the sales histogram.
    pub histogram_bins: usize,
    /// Rows shown by the raw data preview.
    pub preview_rows: usize,
    /// Rows in the top products table.
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("DATA.csv"),
            date_range_default: DateRangeDefault::FullSpan,
            histogram_bins: 30,
            preview_rows: 5,
            top_n: 5,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `path` if it exists; defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No {} found, using default settings", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring settings: {e}");
                Self::default()
            }
        }
    }
}
