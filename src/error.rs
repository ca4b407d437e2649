//! Error types for notes-bible
//!
//! This module provides error handling for catalog lookups, downloads,
//! local storage and note serialization.

use thiserror::Error;

/// Main error type for notes-bible operations
#[derive(Error, Debug)]
pub enum BibleError {
    /// Requested version is not part of the static catalog
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A download for this version is already running
    #[error("Download already in progress: {0}")]
    DownloadInProgress(String),

    /// Network/transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for notes-bible operations
pub type Result<T> = std::result::Result<T, BibleError>;

impl From<reqwest::Error> for BibleError {
    fn from(err: reqwest::Error) -> Self {
        BibleError::Network(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BibleError {
    fn from(err: tokio::task::JoinError) -> Self {
        BibleError::Storage(format!("Storage task failed: {}", err))
    }
}

impl From<anyhow::Error> for BibleError {
    fn from(err: anyhow::Error) -> Self {
        BibleError::Generic(err.to_string())
    }
}
