//! Application configuration.
//!
//! Small TOML file under the per-user config directory. Every field has a
//! default, so a missing or partial file is never an error.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "FairyRealm";
const APPLICATION: &str = "FairySchedule";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the schedule snapshot path; defaults to
    /// `schedules.json` in the per-user data directory.
    pub data_file: Option<PathBuf>,
    /// How often the reminder tick loop runs.
    pub tick_interval_secs: u64,
    pub notifications_enabled: bool,
    /// Months shown per window.
    pub window_months: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            tick_interval_secs: 30,
            notifications_enabled: true,
            window_months: 4,
        }
    }
}

impl AppConfig {
    /// Load the config file, falling back to defaults when it is missing.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config = toml::from_str(&data)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Like `load`, but a broken config file only costs a warning.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("using default config: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("no config directory available")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dir {}", parent.display()))?;
        }
        let data = toml::to_string_pretty(self)?;
        fs::write(&path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Where the schedule snapshot lives.
    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_file {
            return Ok(path.clone());
        }
        let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .context("no user data directory available")?;
        Ok(dirs.data_dir().join("schedules.json"))
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
