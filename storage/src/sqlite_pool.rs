//! SQLite connection pool wrapper for the storage crate.

use std::path::Path;
use std::time::Duration;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use crate::error::StorageError;

/// Manages a single SQLite pool.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Opens an existing database read-only over one long-lived connection.
    ///
    /// The messaging app keeps writing to the file; `busy_timeout` lets queries wait for its
    /// locks instead of failing with `SQLITE_BUSY`.
    pub async fn open_read_only(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }
        info!(path = %path.display(), busy_timeout_ms = busy_timeout.as_millis() as u64, "Opening message store read-only");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
