//! Storage error types.
//!
//! Returned by the chat database reader; the relay maps them to `RelayError::StoreUnavailable`.

use relay_core::RelayError;
use thiserror::Error;

/// Errors that can occur when reading the message store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for RelayError {
    fn from(err: StorageError) -> Self {
        RelayError::StoreUnavailable(err.to_string())
    }
}
