//! Indexer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during indexing operations.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Version-control query failed or timed out
    #[error("Version control error: {0}")]
    VersionControl(String),

    /// Extraction worker panicked or was cancelled
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for IndexerError {
    fn from(e: serde_json::Error) -> Self {
        IndexerError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for IndexerError {
    fn from(e: serde_yaml::Error) -> Self {
        IndexerError::Config(e.to_string())
    }
}

impl From<globset::Error> for IndexerError {
    fn from(e: globset::Error) -> Self {
        IndexerError::Config(e.to_string())
    }
}
