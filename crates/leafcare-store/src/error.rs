//! Error types for leafcare-store.

use std::path::PathBuf;

/// Result type for leafcare-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in leafcare-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Stored health status label is not recognised.
    #[error("Invalid stored value: {0}")]
    Parse(#[from] leafcare_types::ParseError),

    /// Serialization error for the JSON columns.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
