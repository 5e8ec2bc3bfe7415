//! Error types for fabex.

use std::path::PathBuf;
use thiserror::Error;

/// fabex error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input the build cannot proceed without (extract spec, source root).
    #[error("Missing input {}: {source}", .path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Scanner error: {0}")]
    Scanner(String),

    #[error("Path normalization error: {0}")]
    Normalize(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an I/O failure on a required input file or directory.
    pub fn missing_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::MissingInput {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for fabex operations.
pub type Result<T> = std::result::Result<T, Error>;
