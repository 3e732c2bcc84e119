//! Error types for store operations.

use rollcall_canonical::EventId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored event could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Audit journal error.
    #[error("journal error: {0}")]
    Journal(#[from] rollcall_journal::JournalError),
    /// `insert` found an event with the same id.
    #[error("event {0} already exists")]
    AlreadyExists(EventId),
    /// A thread panicked while holding a store lock.
    #[error("store lock poisoned")]
    Poisoned,
}
