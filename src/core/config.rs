//! Site configuration loaded from `.aquadesk/config.toml`.

use crate::core::error::AquaError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file name, relative to the data directory.
    pub file: String,
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: schemas::DEFAULT_DB_NAME.to_string(),
            busy_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Rows shown by `ops species list`.
    pub species_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { species_limit: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the data directory. No file means defaults.
    pub fn load(data_dir: &Path) -> Result<Self, AquaError> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path).map_err(AquaError::IoError)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AquaError> {
        toml::from_str(content).map_err(|e| AquaError::ConfigError(e.to_string()))
    }

    /// Writes the default config unless one already exists.
    pub fn write_default(data_dir: &Path) -> Result<bool, AquaError> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Ok(false);
        }
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| AquaError::ConfigError(e.to_string()))?;
        fs::write(&config_path, body).map_err(AquaError::IoError)?;
        Ok(true)
    }
}
