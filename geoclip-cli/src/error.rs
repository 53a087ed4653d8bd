//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use geoclip::config::ConfigFileError;
use geoclip::fetch::FetchError;
use geoclip::pipeline::RunError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Input file is not the expected JSON
    InvalidInput { path: PathBuf, reason: String },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Failed to build the Overpass client
    Client(FetchError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// The pipeline run ended with an error
    Run(RunError),
}

impl CliError {
    pub fn invalid_input(path: &Path, reason: impl fmt::Display) -> Self {
        CliError::InvalidInput {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Run(RunError::Boundary(_)) => {
                eprintln!();
                eprintln!("The boundary file must contain one of:");
                eprintln!("  1. A Polygon or MultiPolygon geometry");
                eprintln!("  2. A Feature wrapping such a geometry");
                eprintln!("  3. A FeatureCollection of such features");
            }
            CliError::Run(RunError::Cancelled) => {
                eprintln!();
                eprintln!("No output was written.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::InvalidInput { path, reason } => {
                write!(f, "Invalid input in '{}': {}", path.display(), reason)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Client(e) => write!(f, "Failed to create Overpass client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Run(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Client(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Run(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        CliError::Run(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoclip::geometry::BoundaryError;

    #[test]
    fn test_boundary_error_message() {
        let err = CliError::from(RunError::Boundary(BoundaryError::Empty));
        assert!(err.to_string().starts_with("Invalid boundary"));
    }

    #[test]
    fn test_invalid_input_names_the_file() {
        let err = CliError::invalid_input(Path::new("jobs.json"), "expected an array");
        assert_eq!(
            err.to_string(),
            "Invalid input in 'jobs.json': expected an array"
        );
    }
}
