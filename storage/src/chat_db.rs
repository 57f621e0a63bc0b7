//! Cursor-driven reader over the Messages `chat.db`.
//!
//! Joins `message` with `handle`, `attachment` and `chat`, keeps incoming rows that carry text,
//! an archived body, or an attachment the relay can handle, and recovers text from
//! `attributedBody` when the plain column is empty.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{RawMessageRecord, RelayError};
use tracing::{debug, error, info, instrument};

use crate::error::StorageError;
use crate::models::MessageRow;
use crate::repository::MessageSource;
use crate::sqlite_pool::SqlitePoolManager;

const SELECT_ROWS: &str = r#"
    SELECT
        m.ROWID AS id,
        COALESCE(h.id, 'unknown') AS sender,
        m.text AS text,
        m.attributedBody AS attributed_body,
        a.filename AS attachment_name,
        COALESCE(h.service, m.service) AS service,
        COALESCE(m.date, 0) AS timestamp,
        a.mime_type AS mime_type,
        c.guid AS chat_guid
    FROM message m
    LEFT JOIN handle h ON m.handle_id = h.ROWID
    LEFT JOIN message_attachment_join maj ON m.ROWID = maj.message_id
    LEFT JOIN attachment a ON maj.attachment_id = a.ROWID
    LEFT JOIN chat_message_join cmj ON m.ROWID = cmj.message_id
    LEFT JOIN chat c ON cmj.chat_id = c.ROWID
    WHERE m.is_from_me = 0
"#;

const HANDLED_CONTENT: &str = r#"
    AND (
        m.text IS NOT NULL
        OR m.attributedBody IS NOT NULL
        OR a.mime_type LIKE 'image/%'
        OR a.mime_type LIKE 'audio/%'
        OR LOWER(a.filename) LIKE '%.pdf'
        OR LOWER(a.filename) LIKE '%.docx'
        OR LOWER(a.filename) LIKE '%.xlsx'
        OR LOWER(a.filename) LIKE '%.rtf'
        OR LOWER(a.filename) LIKE '%.txt'
    )
"#;

/// Progress watermark: highest record id handed out so far.
///
/// `None` until the first poll pins it to the store's current maximum, so the backlog is
/// never replayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(Option<i64>);

impl Cursor {
    pub fn at(id: i64) -> Self {
        Cursor(Some(id))
    }

    pub fn position(&self) -> Option<i64> {
        self.0
    }

    /// Moves forward to `id`; never moves back.
    pub fn advance_to(&mut self, id: i64) {
        if self.0.map_or(true, |current| id > current) {
            self.0 = Some(id);
        }
    }
}

/// Read-only reader over `chat.db`. Owns the cursor.
pub struct ChatDbReader {
    pool_manager: SqlitePoolManager,
    cursor: Cursor,
}

impl ChatDbReader {
    /// Opens `chat.db` read-only with the given busy timeout.
    pub async fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::open_read_only(path, busy_timeout).await?;
        Ok(Self::with_pool(pool_manager))
    }

    pub fn with_pool(pool_manager: SqlitePoolManager) -> Self {
        Self {
            pool_manager,
            cursor: Cursor::default(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Current maximum message id; 0 for an empty store.
    pub async fn max_id(&self) -> Result<i64, StorageError> {
        let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(ROWID), 0) FROM message")
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(max)
    }

    /// Incoming records with `id > after`, ordered by stored date then id.
    pub async fn fetch_after(&self, after: i64) -> Result<Vec<RawMessageRecord>, StorageError> {
        let sql = format!(
            "{SELECT_ROWS} {HANDLED_CONTENT} AND m.ROWID > ? ORDER BY m.date ASC, m.ROWID ASC"
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(after)
            .fetch_all(self.pool_manager.pool())
            .await?;
        Ok(rows.into_iter().map(MessageRow::into_record).collect())
    }

    /// The last `limit` incoming rows regardless of the cursor, oldest first. For diagnostics.
    pub async fn recent_rows(&self, limit: i64) -> Result<Vec<RawMessageRecord>, StorageError> {
        let sql = format!("{SELECT_ROWS} ORDER BY m.ROWID DESC LIMIT ?");
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool_manager.pool())
            .await?;
        let mut records: Vec<RawMessageRecord> =
            rows.into_iter().map(MessageRow::into_record).collect();
        records.reverse();
        Ok(records)
    }

    /// Returns unseen records and advances the cursor to the highest id returned.
    ///
    /// The first call only pins the cursor and returns nothing. Store failures are logged and
    /// yield an empty batch with the cursor unchanged, so the range is retried next poll.
    #[instrument(skip(self), fields(cursor = ?self.cursor.position()))]
    pub async fn poll(&mut self) -> Vec<RawMessageRecord> {
        let Some(after) = self.cursor.position() else {
            match self.max_id().await {
                Ok(max) => {
                    self.cursor.advance_to(max);
                    info!(cursor = max, "Initialized cursor to latest message id");
                }
                Err(e) => error!(error = %RelayError::from(e), "Failed to initialize cursor"),
            }
            return Vec::new();
        };

        match self.fetch_after(after).await {
            Ok(records) => {
                if let Some(max) = records.iter().map(|r| r.id).max() {
                    self.cursor.advance_to(max);
                    info!(
                        record_count = records.len(),
                        cursor = max,
                        "Fetched new messages"
                    );
                } else {
                    debug!("No new messages");
                }
                records
            }
            Err(e) => {
                error!(error = %RelayError::from(e), cursor = after, "Message store query failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl MessageSource for ChatDbReader {
    async fn poll(&mut self) -> Vec<RawMessageRecord> {
        ChatDbReader::poll(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_only_moves_forward() {
        let mut cursor = Cursor::default();
        assert_eq!(cursor.position(), None);
        cursor.advance_to(10);
        cursor.advance_to(4);
        assert_eq!(cursor.position(), Some(10));
        cursor.advance_to(12);
        assert_eq!(cursor, Cursor::at(12));
    }
}
