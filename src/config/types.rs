use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub workarounds: Workarounds,

    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    /// Also write daily-rotated log files
    #[serde(default)]
    pub log_file: bool,

    /// Directory for log files, defaults to the user's data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

/// Workarounds for misbehaving display hardware, handed to the settings manager as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workarounds {
    /// How long HDR stays off while blanking; no value disables blanking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_blank_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the retained snapshot is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Layout document for the simulated display backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_retention_days() -> u64 {
    7
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            log_file: false,
            log_dir: None,
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl Workarounds {
    pub fn hdr_blank_delay(&self) -> Option<Duration> {
        self.hdr_blank_delay_ms.map(Duration::from_millis)
    }
}

impl PathsConfig {
    /// Configured state file, or the default one under the user's data directory
    pub fn state_file_or_default(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => default_state_file(),
        }
    }
}

pub fn default_state_file() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".local/share/display-settings-manager/persistent_state.json"))
}

impl Config {
    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.general.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Unknown log level '{}', expected one of {:?}",
                self.general.log_level,
                LEVELS
            );
        }

        if self.general.log_retention_days == 0 {
            anyhow::bail!("log_retention_days must be at least 1");
        }

        if let Some(delay) = self.workarounds.hdr_blank_delay_ms {
            if delay > 10_000 {
                anyhow::bail!("hdr_blank_delay_ms of {} is longer than 10 seconds", delay);
            }
        }

        Ok(())
    }
}
