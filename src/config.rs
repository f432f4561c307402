use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_runway_target_days")]
    pub runway_target_days: u32,
    /// Daily spend assumed by the runway projection when this month has no expenses
    #[serde(default = "default_fallback_daily_spend")]
    pub fallback_daily_spend: f64,
    #[serde(default = "default_clipboard_history_limit")]
    pub clipboard_history_limit: u32,
    #[serde(default = "default_expense_categories")]
    pub expense_categories: Vec<String>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            runway_target_days: default_runway_target_days(),
            fallback_daily_spend: default_fallback_daily_spend(),
            clipboard_history_limit: default_clipboard_history_limit(),
            expense_categories: default_expense_categories(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // This is a fallback - actual profile will be determined at load time
    Config::default_data_file_for_profile(utils::Profile::Prod, "daybook.db")
}

fn default_log_dir() -> String {
    Config::default_data_file_for_profile(utils::Profile::Prod, "logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_runway_target_days() -> u32 {
    30
}

fn default_fallback_daily_spend() -> f64 {
    50_000.0
}

fn default_clipboard_history_limit() -> u32 {
    50
}

fn default_expense_categories() -> Vec<String> {
    [
        "Food",
        "Transport",
        "Shopping",
        "Bills",
        "Entertainment",
        "Health",
        "Education",
        "Other",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid setting {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from the profile's config file, or create it with
    /// defaults if missing. Data and log paths always follow the profile.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let mut config = Self::load_or_create(&config_path, profile)?;

        // Ensure database path matches profile (in case config was manually edited)
        config.database_path = Self::default_data_file_for_profile(profile, "daybook.db");
        config.log_dir = Self::default_data_file_for_profile(profile, "logs");
        Ok(config)
    }

    /// Load configuration from an explicit file. Paths in the file are kept as
    /// written; a missing file is created with the profile's defaults.
    pub fn load_from_path(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        Self::load_or_create(path, profile)
    }

    fn load_or_create(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config and save it
            let mut config = Config {
                database_path: Self::default_data_file_for_profile(profile, "daybook.db"),
                log_dir: Self::default_data_file_for_profile(profile, "logs"),
                ..Config::default()
            };
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.fallback_daily_spend.is_finite() || self.fallback_daily_spend < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "fallback_daily_spend = {}",
                self.fallback_daily_spend
            )));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue("database_path is empty".to_string()));
        }
        Ok(())
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Path of a file under the profile's data directory
    fn default_data_file_for_profile(profile: utils::Profile, file: &str) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join(file).to_string_lossy().to_string()
        } else {
            // Fallback paths - platform-specific
            #[cfg(target_os = "macos")]
            let base = match profile {
                utils::Profile::Dev => "~/Library/Application Support/daybook-dev",
                utils::Profile::Prod => "~/Library/Application Support/daybook",
            };
            #[cfg(not(target_os = "macos"))]
            let base = match profile {
                utils::Profile::Dev => "~/.local/share/daybook-dev",
                utils::Profile::Prod => "~/.local/share/daybook",
            };
            format!("{}/{}", base, file)
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Get the expanded log directory
    pub fn get_log_dir(&self) -> PathBuf {
        utils::expand_path(&self.log_dir)
    }

    /// Default directory for JSON exports, next to the database file
    pub fn get_export_dir(&self) -> PathBuf {
        let db_path = self.get_database_path();
        db_path
            .parent()
            .map(|dir| dir.join("exports"))
            .unwrap_or_else(|| PathBuf::from("exports"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.runway_target_days, 30);
        assert_eq!(config.clipboard_history_limit, 50);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database_path = \"/tmp/x.db\"\nrunway_target_days = 14\n").unwrap();

        let config = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(config.database_path, "/tmp/x.db");
        assert_eq!(config.runway_target_days, 14);
        assert_eq!(config.fallback_daily_spend, 50_000.0);
        assert!(config.expense_categories.iter().any(|c| c == "Other"));
        assert_eq!(config.get_export_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn negative_fallback_spend_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "fallback_daily_spend = -5.0\n").unwrap();

        let err = Config::load_from_path(&path, utils::Profile::Prod).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "runway_target_days = \"soon\"\n").unwrap();

        let err = Config::load_from_path(&path, utils::Profile::Prod).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
