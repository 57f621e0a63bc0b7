//! # relay-core
//!
//! Core types and traits for the iMessage relay: the decoded store row ([`RawMessageRecord`]),
//! logical turns ([`MessageGroup`]), the error taxonomy ([`RelayError`]), the collaborator traits
//! the dispatcher delegates to, and tracing initialization. Transport-agnostic; used by storage,
//! memory and imessage-bot.

pub mod collaborators;
pub mod error;
pub mod logger;
pub mod types;

pub use collaborators::{
    Assistant, AudioTranscriber, Collaborators, DocumentAnalyzer, ImageAnalyzer, ImageGenerator,
    MessageSender, SearchAdvisor, SearchSummarizer, WebSearch,
};
pub use error::{RelayError, Result};
pub use logger::init_tracing;
pub use types::{
    ContentKind, MessageGroup, RawMessageRecord, SearchHints, SearchResult, ServiceKind,
    APPLE_EPOCH_OFFSET_SECS,
};
