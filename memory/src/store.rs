//! # Context Store
//!
//! Process-wide map from conversation key (chat GUID, or sender handle when the chat has none)
//! to [`ConversationContext`].
//!
//! ## Update flow
//!
//! 1. Control characters are stripped; empty messages are ignored.
//! 2. The message is appended to the bounded history.
//! 3. Topic words are merged into `topics`.
//! 4. For user messages only: product mentions are extracted and merged, with correction
//!    handling (see [`ContextStore::update_at`]).
//!
//! Assistant replies are stored with [`ASSISTANT_PREFIX`] so later scans can tell them apart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use relay_core::SearchHints;
use tracing::{debug, info};

use crate::config::ContextConfig;
use crate::context::ConversationContext;
use crate::correction::{has_correction_cue, is_negated};
use crate::rules::{extract_color, extract_mentions};
use crate::scoring::best_mention;
use crate::topics::extract_topics;
use crate::types::{MemoryRole, ProductCategory, ProductMention};

/// Prefix marking stored assistant replies.
pub const ASSISTANT_PREFIX: &str = "[ASSISTANT]: ";

/// Messages handed to the summarizer as hints.
const HINT_MESSAGES: usize = 3;

/// Per-conversation memory. Owned by the polling loop; mutated through `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    config: ContextConfig,
    conversations: HashMap<String, ConversationContext>,
}

impl ContextStore {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            conversations: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn get(&self, conversation: &str) -> Option<&ConversationContext> {
        self.conversations.get(conversation)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Records a message now. Messages starting with [`ASSISTANT_PREFIX`] are treated as replies.
    pub fn update(&mut self, conversation: &str, message: &str) {
        self.update_at(conversation, message, Utc::now());
    }

    /// Records a message with the given role now.
    pub fn record(&mut self, conversation: &str, role: MemoryRole, message: &str) {
        self.record_at(conversation, role, message, Utc::now());
    }

    /// Records a message with the given role at `now`; assistant text gets the reply prefix.
    pub fn record_at(
        &mut self,
        conversation: &str,
        role: MemoryRole,
        message: &str,
        now: DateTime<Utc>,
    ) {
        match role {
            MemoryRole::Assistant if !message.starts_with(ASSISTANT_PREFIX) => {
                let prefixed = format!("{}{}", ASSISTANT_PREFIX, message);
                self.update_at(conversation, &prefixed, now);
            }
            _ => self.update_at(conversation, message, now),
        }
    }

    /// Records a message at `now`.
    ///
    /// Product handling for user messages: every mention is counted (inserted with count 1 or
    /// incremented). When the message carries a correction cue, mentions directly negated
    /// ("not an iPhone 15") are not counted, and the last remaining mention whose category
    /// already has other entries becomes the correction target: those other entries are marked
    /// `corrected`, the target is marked `is_correction` and gets the configured mention bonus.
    /// A plain re-mention of a corrected product revives it.
    pub fn update_at(&mut self, conversation: &str, message: &str, now: DateTime<Utc>) {
        let clean: String = message
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        if conversation.is_empty() || clean.trim().is_empty() {
            return;
        }

        let capacity = self.config.capacity;
        let bonus = self.config.correction_mention_bonus;
        let ctx = self
            .conversations
            .entry(conversation.to_string())
            .or_insert_with(|| ConversationContext::new(now));

        if let Some(evicted) = ctx.push_message(clean.clone(), capacity) {
            debug!(conversation = %conversation, evicted = %evicted, "Evicted oldest message from context");
        }
        let body = clean.strip_prefix(ASSISTANT_PREFIX).unwrap_or(&clean);
        ctx.topics.extend(extract_topics(body));
        ctx.last_updated = now;

        if !clean.starts_with(ASSISTANT_PREFIX) {
            track_products(ctx, &clean, now, bonus);
        }

        debug!(
            conversation = %conversation,
            messages = ctx.recent_messages.len(),
            topics = ctx.topics.len(),
            products = ctx.products.len(),
            "Context updated"
        );
    }

    /// Most likely referent for a follow-up question, scored now.
    pub fn resolve_referent(&self, conversation: &str) -> Option<&ProductMention> {
        self.resolve_referent_at(conversation, Utc::now())
    }

    /// Highest-scoring non-corrected mention at `now`; `None` without mentions.
    pub fn resolve_referent_at(
        &self,
        conversation: &str,
        now: DateTime<Utc>,
    ) -> Option<&ProductMention> {
        let ctx = self.conversations.get(conversation)?;
        let (mention, score) =
            best_mention(&ctx.products, &ctx.recent_messages, now, &self.config)?;
        debug!(
            conversation = %conversation,
            referent = %mention.full_name,
            score,
            "Resolved referent"
        );
        Some(mention)
    }

    /// Hints for the search summarizer: resolved referent, last few messages, topics.
    pub fn search_hints(&self, conversation: &str) -> SearchHints {
        self.search_hints_at(conversation, Utc::now())
    }

    pub fn search_hints_at(&self, conversation: &str, now: DateTime<Utc>) -> SearchHints {
        let Some(ctx) = self.conversations.get(conversation) else {
            return SearchHints::default();
        };
        let skip = ctx.recent_messages.len().saturating_sub(HINT_MESSAGES);
        SearchHints {
            referent: self
                .resolve_referent_at(conversation, now)
                .map(|m| m.full_name.clone()),
            recent_messages: ctx.recent_messages.iter().skip(skip).cloned().collect(),
            topics: ctx.topics.iter().cloned().collect(),
        }
    }
}

fn track_products(ctx: &mut ConversationContext, text: &str, now: DateTime<Utc>, bonus: u32) {
    let mentions = extract_mentions(text);
    if mentions.is_empty() {
        return;
    }
    let color = extract_color(text);
    let correcting = has_correction_cue(text);
    let negated: Vec<bool> = mentions
        .iter()
        .map(|m| correcting && is_negated(text, m.span.start))
        .collect();

    let target = if correcting {
        mentions
            .iter()
            .enumerate()
            .filter(|(i, _)| !negated[*i])
            .filter(|(_, m)| {
                ctx.products
                    .iter()
                    .any(|p| p.category == m.category && p.key != m.key)
            })
            .map(|(i, _)| i)
            .last()
    } else {
        None
    };

    if let Some(t) = target {
        let winner = &mentions[t];
        for stale in ctx
            .products
            .iter_mut()
            .filter(|p| p.category == winner.category && p.key != winner.key)
        {
            if !stale.corrected {
                info!(stale = %stale.full_name, replacement = %winner.full_name, "Product mention corrected");
            }
            stale.corrected = true;
        }
    }

    for (i, found) in mentions.iter().enumerate() {
        ctx.entities.insert(found.full_name.clone());
        if negated[i] {
            debug!(product = %found.full_name, "Skipping negated product mention");
            continue;
        }
        let color = match found.category {
            ProductCategory::Company => None,
            _ => color.as_deref(),
        };
        let mention = ctx.upsert_mention(found, color, now);
        if target == Some(i) {
            mention.is_correction = true;
            mention.corrected = false;
            mention.mention_count += bonus;
        } else if !correcting && mention.corrected {
            mention.corrected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn history_is_bounded() {
        let mut store = ContextStore::default();
        let t0 = Utc::now();
        for i in 0..12 {
            store.update_at("chat", &format!("message number {}", i), t0);
        }
        let ctx = store.get("chat").unwrap();
        assert_eq!(ctx.recent_messages().len(), 10);
        assert_eq!(ctx.recent_messages().front().unwrap(), "message number 2");
        assert_eq!(ctx.last_message(), Some("message number 11"));
        assert_eq!(ctx.previous_message(), Some("message number 10"));
    }

    #[test]
    fn control_characters_are_stripped_and_empty_ignored() {
        let mut store = ContextStore::default();
        store.update("chat", "\u{0007}\n\t");
        assert!(store.is_empty());
        store.update("chat", "hello\u{0000} there");
        assert_eq!(store.get("chat").unwrap().last_message(), Some("hello there"));
    }

    #[test]
    fn repeat_mentions_increment_count() {
        let mut store = ContextStore::default();
        let t0 = Utc::now();
        store.update_at("chat", "I like the AirPods Pro", t0);
        store.update_at("chat", "airpods pro are pricey", t0 + Duration::seconds(5));
        let ctx = store.get("chat").unwrap();
        let mention = ctx.product("airpods_pro").unwrap();
        assert_eq!(mention.mention_count, 2);
        assert_eq!(mention.first_mentioned, t0);
        assert_eq!(mention.last_mentioned, t0 + Duration::seconds(5));
        assert!(ctx.entities().contains("AirPods Pro"));
    }

    #[test]
    fn assistant_replies_do_not_create_products() {
        let mut store = ContextStore::default();
        store.record("chat", MemoryRole::Assistant, "The Pixel 8 is great");
        let ctx = store.get("chat").unwrap();
        assert!(ctx.products().is_empty());
        assert_eq!(ctx.last_message(), Some("[ASSISTANT]: The Pixel 8 is great"));
        assert!(ctx.topics().contains("great"));
    }

    #[test]
    fn color_is_attached() {
        let mut store = ContextStore::default();
        store.update("chat", "the blue iPhone 15");
        let ctx = store.get("chat").unwrap();
        assert_eq!(ctx.product("iphone_15").unwrap().color.as_deref(), Some("blue"));
    }

    #[test]
    fn search_hints_carry_referent_and_recent_messages() {
        let mut store = ContextStore::default();
        let t0 = Utc::now();
        store.update_at("chat", "one", t0);
        store.update_at("chat", "looking at the Pixel 8", t0);
        store.update_at("chat", "three", t0);
        store.update_at("chat", "how much is it", t0);
        let hints = store.search_hints_at("chat", t0);
        assert_eq!(hints.referent.as_deref(), Some("Pixel 8"));
        assert_eq!(
            hints.recent_messages,
            vec!["looking at the Pixel 8", "three", "how much is it"]
        );
        assert!(hints.topics.contains(&"pixel".to_string()));
        assert!(store.search_hints("missing").is_empty());
    }
}
