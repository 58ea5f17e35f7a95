// src/core/errors.rs
//! Error taxonomy shared by the store, the service and its callers

use thiserror::Error;

/// Failures of the key-value storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong while handling a history request
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Empty text")]
    Validation,

    #[error("Duplicate entry")]
    Duplicate,

    #[error("Entry not found")]
    NotFound(String),

    /// No millisecond is left past the newest issued id
    #[error("Timestamp range exhausted")]
    TimestampExhausted,

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The receiving side of a request is gone
    #[error("Channel error: {0}")]
    Channel(String),

    /// The store answered `success: false`
    #[error("{0}")]
    Rejected(String),
}

impl HistoryError {
    pub fn is_channel(&self) -> bool {
        matches!(self, HistoryError::Channel(_))
    }
}
