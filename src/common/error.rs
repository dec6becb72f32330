//! Error types for stepwright
//!
//! Error messages are written for scenario authors, with hints on how to
//! resolve common issues. Step-level failures live in `engine::error`; this
//! type covers everything around them (config, files, launching browsers).

use std::io;
use thiserror::Error;

use crate::engine::SessionError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stepwright
#[derive(Error, Debug)]
pub enum Error {
    // === Scenario Errors ===
    #[error("Scenario '{path}' is invalid:\n{reasons}")]
    InvalidScenario { path: String, reasons: String },

    #[error("No scenario matches '{0}'. Use 'stepwright list' to see saved scenarios")]
    ScenarioNotFound(String),

    #[error("{failed} of {total} scenario(s) failed")]
    ScenariosFailed { failed: usize, total: usize },

    #[error("{invalid} of {total} scenario file(s) are invalid")]
    InvalidScenarios { invalid: usize, total: usize },

    // === Browser Errors ===
    #[error("Node.js executable '{0}' not found. Install Node.js or set [browser] node in the config")]
    NodeNotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser session error: {0}")]
    Session(#[from] SessionError),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid scenario error from a list of reasons
    pub fn invalid_scenario<S: AsRef<str>>(path: &str, reasons: &[S]) -> Self {
        Self::InvalidScenario {
            path: path.to_string(),
            reasons: reasons
                .iter()
                .map(|r| format!("  - {}", r.as_ref()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file write error
    pub fn file_write(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_scenario_lists_reasons() {
        let err = Error::invalid_scenario("login.json", &["steps[0]: click requires a locator"]);
        let text = err.to_string();
        assert!(text.contains("login.json"));
        assert!(text.contains("  - steps[0]: click requires a locator"));
    }
}
