//! Core types: stored record, message group, service and content kinds, search results.
//!
//! One file per main type, as in the rest of the workspace.

mod content;
mod group;
mod record;
mod search;
mod service;

pub use content::ContentKind;
pub use group::MessageGroup;
pub use record::{RawMessageRecord, APPLE_EPOCH_OFFSET_SECS};
pub use search::{SearchHints, SearchResult};
pub use service::ServiceKind;
