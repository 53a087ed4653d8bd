//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization, client
//! creation and output writing to reduce duplication across command handlers.

use std::path::Path;

use geoclip::config::ConfigFile;
use geoclip::fetch::{BatchFetcher, ReqwestOverpassClient};
use geoclip::geometry::{Feature, FeatureCollection};
use geoclip::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Mirror log output to stdout
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(verbose: bool, debug_mode: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, verbose, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("geoclip v{}", geoclip::VERSION);
        info!("geoclip CLI: {} command", command);
    }

    /// Create an Overpass fetcher from the configuration.
    ///
    /// `endpoint` overrides the configured interpreter URL.
    pub fn create_fetcher(
        &self,
        endpoint: Option<String>,
    ) -> Result<BatchFetcher<ReqwestOverpassClient>, CliError> {
        let mut fetch_config = self.config.fetch_config();
        if let Some(endpoint) = endpoint {
            fetch_config = fetch_config.with_endpoint(endpoint);
        }

        let client =
            ReqwestOverpassClient::new(fetch_config.endpoint.clone(), fetch_config.request_timeout)
                .map_err(CliError::Client)?;

        info!(
            endpoint = %fetch_config.endpoint,
            max_attempts = fetch_config.max_attempts,
            "Overpass client created"
        );
        Ok(BatchFetcher::new(client, fetch_config))
    }

    /// Write features as a GeoJSON FeatureCollection.
    pub fn save_features(&self, path: &Path, features: Vec<Feature>) -> Result<(), CliError> {
        let count = features.len();
        let collection = FeatureCollection::from(features);
        let write_error = |error| CliError::FileWrite {
            path: path.to_path_buf(),
            error,
        };

        let json = serde_json::to_string_pretty(&collection)
            .map_err(|e| write_error(std::io::Error::other(e)))?;
        std::fs::write(path, json).map_err(write_error)?;

        info!(path = %path.display(), features = count, "Output written");
        println!("✓ Saved {} feature(s) to {}", count, path.display());

        Ok(())
    }
}
