//! # Conversation Context
//!
//! Everything remembered about one conversation. Created lazily on the first message and kept
//! for the life of the process.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::rules::ExtractedMention;
use crate::types::ProductMention;

/// Bounded recent history plus the topics, entities and products it mentioned.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub(crate) recent_messages: VecDeque<String>,
    pub(crate) topics: BTreeSet<String>,
    pub(crate) entities: BTreeSet<String>,
    /// In first-mentioned order; scoring ties fall back to this order.
    pub(crate) products: Vec<ProductMention>,
    pub(crate) last_updated: DateTime<Utc>,
}

impl ConversationContext {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            recent_messages: VecDeque::new(),
            topics: BTreeSet::new(),
            entities: BTreeSet::new(),
            products: Vec::new(),
            last_updated: now,
        }
    }

    /// Recent messages, oldest first.
    pub fn recent_messages(&self) -> &VecDeque<String> {
        &self.recent_messages
    }

    /// Newest stored message.
    pub fn last_message(&self) -> Option<&str> {
        self.recent_messages.back().map(String::as_str)
    }

    /// The message before the newest one.
    pub fn previous_message(&self) -> Option<&str> {
        let len = self.recent_messages.len();
        if len < 2 {
            return None;
        }
        self.recent_messages.get(len - 2).map(String::as_str)
    }

    pub fn topics(&self) -> &BTreeSet<String> {
        &self.topics
    }

    pub fn entities(&self) -> &BTreeSet<String> {
        &self.entities
    }

    pub fn products(&self) -> &[ProductMention] {
        &self.products
    }

    pub fn product(&self, key: &str) -> Option<&ProductMention> {
        self.products.iter().find(|p| p.key == key)
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Appends a message, returning the evicted oldest one when over `capacity`.
    pub(crate) fn push_message(&mut self, message: String, capacity: usize) -> Option<String> {
        self.recent_messages.push_back(message);
        if self.recent_messages.len() > capacity {
            self.recent_messages.pop_front()
        } else {
            None
        }
    }

    /// Inserts a new mention with count 1, or counts a repeat sighting.
    pub(crate) fn upsert_mention(
        &mut self,
        found: &ExtractedMention,
        color: Option<&str>,
        now: DateTime<Utc>,
    ) -> &mut ProductMention {
        let index = match self.products.iter().position(|p| p.key == found.key) {
            Some(i) => {
                let existing = &mut self.products[i];
                existing.mention_count += 1;
                existing.last_mentioned = now;
                if existing.url.is_none() {
                    existing.url = found.url.clone();
                }
                i
            }
            None => {
                self.products.push(ProductMention {
                    key: found.key.clone(),
                    brand: found.brand.clone(),
                    model: found.model.clone(),
                    category: found.category,
                    full_name: found.full_name.clone(),
                    first_mentioned: now,
                    last_mentioned: now,
                    mention_count: 1,
                    corrected: false,
                    is_correction: false,
                    color: None,
                    url: found.url.clone(),
                });
                self.products.len() - 1
            }
        };
        let mention = &mut self.products[index];
        if let Some(color) = color {
            mention.color = Some(color.to_string());
        }
        mention
    }
}
