//! Fetcher configuration.

use std::time::Duration;

use super::client::{DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT};
use super::query::DEFAULT_QUERY_TIMEOUT_SECS;
use super::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

/// Default pause between consecutive jobs.
pub const DEFAULT_JOB_DELAY: Duration = Duration::from_millis(1000);

/// Default number of elements assembled and clipped per batch.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Default number of batches between cooperative yields.
pub const DEFAULT_YIELD_EVERY_BATCHES: usize = 2;

/// Settings for a [`BatchFetcher`](super::BatchFetcher).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Overpass interpreter URL.
    pub endpoint: String,
    /// HTTP timeout for one request.
    pub request_timeout: Duration,
    /// `[timeout:N]` passed to the Overpass server.
    pub query_timeout_secs: u64,
    pub max_attempts: u32,
    pub job_delay: Duration,
    pub batch_size: usize,
    pub yield_every_batches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            job_delay: DEFAULT_JOB_DELAY,
            batch_size: DEFAULT_BATCH_SIZE,
            yield_every_batches: DEFAULT_YIELD_EVERY_BATCHES,
        }
    }
}

impl FetchConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_query_timeout_secs(mut self, secs: u64) -> Self {
        self.query_timeout_secs = secs;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_job_delay(mut self, delay: Duration) -> Self {
        self.job_delay = delay;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_yield_every_batches(mut self, batches: usize) -> Self {
        self.yield_every_batches = batches.max(1);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.job_delay, Duration::from_millis(1000));
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.yield_every_batches, 2);
        assert_eq!(config.query_timeout_secs, 25);
    }

    #[test]
    fn test_builders_clamp_zero() {
        let config = FetchConfig::default()
            .with_batch_size(0)
            .with_max_attempts(0)
            .with_yield_every_batches(0);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.yield_every_batches, 1);
        assert_eq!(config.retry_policy().max_attempts(), 1);
    }
}
