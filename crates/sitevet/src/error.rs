//! Error types for the sitevet library.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::RecordId;

/// Main error type for sitevet operations.
#[derive(Debug, Error)]
pub enum SitevetError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no columns to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Operation referenced a record id that is not in the table.
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// Error writing the durable local form.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Transport-level failure talking to the remote store.
    ///
    /// The sync engine degrades this to a pending remote write; it only
    /// surfaces directly when a caller uses a [`crate::RemoteStore`] on its own.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sitevet operations.
pub type Result<T> = std::result::Result<T, SitevetError>;
