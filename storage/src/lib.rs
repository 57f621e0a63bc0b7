//! Storage crate: read-only access to the Messages chat database.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – MessageRow (joined chat.db row)
//! - [`repository`] – MessageSource trait polled by the relay loop
//! - [`chat_db`] – ChatDbReader and its Cursor
//! - [`text_extractor`] – attributedBody text recovery
//! - [`sqlite_pool`] – SqlitePoolManager

mod chat_db;
mod error;
mod models;
mod repository;
mod sqlite_pool;
pub mod text_extractor;

pub use chat_db::{ChatDbReader, Cursor};
pub use error::StorageError;
pub use models::MessageRow;
pub use repository::MessageSource;
pub use sqlite_pool::SqlitePoolManager;
pub use text_extractor::extract_attributed_text;
