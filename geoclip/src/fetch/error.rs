//! Error types for Overpass requests.

use thiserror::Error;

/// Errors that can occur during a single Overpass request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Overpass returned HTTP {0}")]
    Status(u16),

    /// The request never produced a response (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The response body is not Overpass JSON.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None if e.is_decode() => FetchError::Decode(e.to_string()),
            None => FetchError::Transport(e.to_string()),
        }
    }
}
