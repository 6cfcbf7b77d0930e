//! Dashboard settings as an injected configuration object.
//!
//! Every field has an explicit default; loading merges file values over the
//! defaults, so a partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    /// Team preselected on startup.
    pub default_team_id: Option<String>,
    /// Auto-refresh interval in milliseconds; 0 disables refreshing.
    pub refresh_interval_ms: u64,
    /// Trailing window for the cumulative flow diagram.
    pub cfd_window_days: usize,
    /// Bin count for the lead-time histogram.
    pub histogram_bins: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_team_id: None,
            refresh_interval_ms: 5 * 60 * 1000,
            cfd_window_days: 30,
            histogram_bins: 10,
        }
    }
}

impl DashboardConfig {
    /// Default location: `~/.teampulse/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".teampulse");
        Ok(dir.join("config.json"))
    }

    /// Load settings from `path`, merging file values over the defaults.
    /// A missing or malformed file falls back to pure defaults.
    pub fn load_or_default(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring malformed config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read one setting by its file key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "defaultTeamId" => self.default_team_id.clone(),
            "refreshIntervalMs" => Some(self.refresh_interval_ms.to_string()),
            "cfdWindowDays" => Some(self.cfd_window_days.to_string()),
            "histogramBins" => Some(self.histogram_bins.to_string()),
            _ => None,
        }
    }

    /// Update one setting by its file key, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaultTeamId" => {
                self.default_team_id = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "refreshIntervalMs" => {
                self.refresh_interval_ms = value
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid interval: {value}")))?;
            }
            "cfdWindowDays" => {
                self.cfd_window_days = value
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid day count: {value}")))?;
            }
            "histogramBins" => {
                self.histogram_bins = value
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid bin count: {value}")))?;
            }
            other => return Err(Error::Config(format!("unknown setting: {other}"))),
        }
        Ok(())
    }

    /// All settings as display pairs, in file-key order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "defaultTeamId",
                self.default_team_id.clone().unwrap_or_else(|| "(unset)".to_string()),
            ),
            ("refreshIntervalMs", self.refresh_interval_ms.to_string()),
            ("cfdWindowDays", self.cfd_window_days.to_string()),
            ("histogramBins", self.histogram_bins.to_string()),
        ]
    }
}
