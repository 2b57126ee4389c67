//! Error types for testrun-rs

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum Error {
    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WalkDir error
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Report artifact could not be written
    #[error("Cannot write report artifact '{path}': {source}")]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Suite-level setup hook failed
    #[error("Setup failed: {message}")]
    Setup { message: String },

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Create a report error for the given artifact path
    pub fn report(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Report {
            path: path.into(),
            source,
        }
    }

    /// Create a setup error
    pub fn setup(message: impl Into<String>) -> Self {
        Error::Setup {
            message: message.into(),
        }
    }
}
