//! # Memory Crate
//!
//! The `memory` crate keeps the per-conversation context the relay uses to disambiguate
//! follow-up questions: the last few messages, the topics and entities they touched, and the
//! products they mentioned, scored so the most likely referent of "it" or "that one" can be
//! recovered.
//!
//! ## Features
//!
//! - **Bounded history**: at most [`ContextConfig::capacity`] messages per conversation
//! - **Rule table** of product patterns ([`rules::PRODUCT_RULES`]), each testable on its own
//! - **Correction tracking**: "not an iPhone 15, a Pixel 8" retires the stale mention
//! - **Referent scoring**: recency + frequency + correction + recent-message bonuses
//!
//! ## Quick Start
//!
//! ```rust
//! use memory::{ContextStore, MemoryRole};
//!
//! let mut store = ContextStore::default();
//! store.update("chat-1", "Thinking about the iPhone 15");
//! store.record("chat-1", MemoryRole::Assistant, "Good choice!");
//!
//! let referent = store.resolve_referent("chat-1").unwrap();
//! assert_eq!(referent.full_name, "iPhone 15");
//! ```
//!
//! ## Modules
//!
//! - [`types`] - MemoryRole, ProductCategory, ProductMention
//! - [`config`] - ContextConfig with the scoring constants
//! - [`rules`] - Product rule table and mention extraction
//! - [`topics`] - Topic word extraction
//! - [`correction`] - Correction cue and negation detection
//! - [`scoring`] - Referent scoring
//! - [`context`] - ConversationContext (one conversation)
//! - [`store`] - ContextStore (all conversations)
//!
//! ## Ownership
//!
//! The store is a plain owned value mutated through `&mut self`. The polling loop is its only
//! writer, so there is no locking.

pub mod config;
pub mod context;
pub mod correction;
pub mod rules;
pub mod scoring;
pub mod store;
pub mod topics;
pub mod types;

pub use config::ContextConfig;
pub use context::ConversationContext;
pub use store::{ContextStore, ASSISTANT_PREFIX};
pub use types::{MemoryRole, ProductCategory, ProductMention};
