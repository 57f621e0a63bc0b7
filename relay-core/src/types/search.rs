//! Search result and summarizer hint types.

use serde::{Deserialize, Serialize};

/// One ranked result from the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Disambiguation hints handed to the summarizer, built from the conversation context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHints {
    /// Full name of the resolved referent product, if any.
    pub referent: Option<String>,
    /// Most recent stored messages, oldest first.
    pub recent_messages: Vec<String>,
    pub topics: Vec<String>,
}

impl SearchHints {
    pub fn is_empty(&self) -> bool {
        self.referent.is_none() && self.recent_messages.is_empty() && self.topics.is_empty()
    }
}
