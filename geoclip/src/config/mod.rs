//! Configuration file for geoclip.
//!
//! `~/.geoclip/config.ini` holds three sections:
//!
//! - `[overpass]`: endpoint and timeouts
//! - `[fetch]`: attempts, job delay and batching
//! - `[logging]`: log file location
//!
//! A missing file yields defaults. Values that fail to parse are reported as
//! [`ConfigFileError::InvalidValue`] rather than silently replaced.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::DEFAULT_LOG_FILE_NAME;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, FetchSettings, LoggingSettings, OverpassSettings};
