//! Default values for all configuration settings.

use crate::fetch::{
    DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_JOB_DELAY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_YIELD_EVERY_BATCHES,
};

use super::settings::*;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "geoclip.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            overpass: OverpassSettings {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
                query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            },
            fetch: FetchSettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                job_delay_ms: DEFAULT_JOB_DELAY.as_millis() as u64,
                batch_size: DEFAULT_BATCH_SIZE,
                yield_every_batches: DEFAULT_YIELD_EVERY_BATCHES,
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
