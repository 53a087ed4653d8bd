//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Overpass service settings
    pub overpass: OverpassSettings,
    /// Fetch pacing and retry settings
    pub fetch: FetchSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Overpass service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassSettings {
    /// Interpreter URL queries are posted to
    pub endpoint: String,
    /// HTTP timeout for one request, in seconds
    pub request_timeout_secs: u64,
    /// Server-side `[timeout:N]`, in seconds
    pub query_timeout_secs: u64,
}

/// Fetch loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Attempts per job before giving up
    pub max_attempts: u32,
    /// Pause between consecutive jobs, in milliseconds
    pub job_delay_ms: u64,
    /// Elements assembled and clipped per batch
    pub batch_size: usize,
    /// Batches between cooperative yields
    pub yield_every_batches: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
