//! User configuration stored as TOML under the platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventColor;
use crate::placement::DEFAULT_VISIBLE_LIMIT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User-tunable calendar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// First day of the week for month and week grids.
    pub week_start: Weekday,
    /// Events shown per day cell before the overflow count kicks in.
    pub visible_limit: usize,
    /// Palette color preselected for new drafts.
    pub default_color: EventColor,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            week_start: Weekday::Sun,
            visible_limit: DEFAULT_VISIBLE_LIMIT,
            default_color: EventColor::Blue,
        }
    }
}

impl CalendarConfig {
    /// Load from the default location, falling back to defaults when no
    /// config file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Write to the default location, creating parent directories as
    /// needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(path) = Self::config_file_path() {
            self.save_to_file(&path)?;
        }
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// `<platform config dir>/datebook/config.toml`
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datebook").join("config.toml"))
    }
}
