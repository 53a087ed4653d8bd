//! Configuration file handling for ~/.geoclip/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], defaults in
//! [`super::defaults`], parsing in [`super::parser`], and serialization in
//! [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::fetch::FetchConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.geoclip/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Render as the commented INI text written to disk.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Fetcher settings derived from the `[overpass]` and `[fetch]` sections.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_endpoint(self.overpass.endpoint.clone())
            .with_request_timeout(Duration::from_secs(self.overpass.request_timeout_secs))
            .with_query_timeout_secs(self.overpass.query_timeout_secs)
            .with_max_attempts(self.fetch.max_attempts)
            .with_job_delay(Duration::from_millis(self.fetch.job_delay_ms))
            .with_batch_size(self.fetch.batch_size)
            .with_yield_every_batches(self.fetch.yield_every_batches)
    }
}

/// Get the path to the config directory (~/.geoclip).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geoclip")
}

/// Get the path to the config file (~/.geoclip/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
