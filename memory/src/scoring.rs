//! Referent scoring.
//!
//! `score = recency + mention + correction + recent_message`:
//!
//! | Part | Value |
//! |------|-------|
//! | recency | `recency_max - min(recency_max, seconds_since_last_mention / recency_decay_secs)` |
//! | mention | `min(mention_cap, mention_count * mention_weight)` |
//! | correction | `correction_bonus` if the mention was introduced as a correction |
//! | recent_message | bonus by position of the newest stored message naming brand or model |

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::ContextConfig;
use crate::types::ProductMention;

/// Score of one mention given the conversation's recent messages (oldest first).
pub fn score_mention(
    mention: &ProductMention,
    recent_messages: &VecDeque<String>,
    now: DateTime<Utc>,
    config: &ContextConfig,
) -> f64 {
    let elapsed = (now - mention.last_mentioned).num_milliseconds().max(0) as f64 / 1000.0;
    let recency = config.recency_max - (elapsed / config.recency_decay_secs).min(config.recency_max);
    let frequency = (mention.mention_count as f64 * config.mention_weight).min(config.mention_cap);
    let correction = if mention.is_correction {
        config.correction_bonus
    } else {
        0.0
    };
    recency + frequency + correction + recent_message_bonus(mention, recent_messages, config)
}

fn recent_message_bonus(
    mention: &ProductMention,
    recent_messages: &VecDeque<String>,
    config: &ContextConfig,
) -> f64 {
    recent_messages
        .iter()
        .rev()
        .zip(config.recent_message_bonuses.iter())
        .find(|(message, _)| names_product(message, mention))
        .map_or(0.0, |(_, bonus)| *bonus)
}

fn names_product(message: &str, mention: &ProductMention) -> bool {
    let message = message.to_lowercase();
    contains_word(&message, &mention.brand.to_lowercase())
        || contains_word(&message, &mention.model.to_lowercase())
}

/// Substring match that does not start or end inside a word.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Highest-scoring non-corrected mention; ties keep the earlier entry.
pub fn best_mention<'a>(
    products: &'a [ProductMention],
    recent_messages: &VecDeque<String>,
    now: DateTime<Utc>,
    config: &ContextConfig,
) -> Option<(&'a ProductMention, f64)> {
    let mut best: Option<(&ProductMention, f64)> = None;
    for mention in products.iter().filter(|m| !m.corrected) {
        let score = score_mention(mention, recent_messages, now, config);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((mention, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductCategory;
    use chrono::Duration;

    fn mention(brand: &str, model: &str, count: u32, at: DateTime<Utc>) -> ProductMention {
        ProductMention {
            key: crate::rules::product_key(brand, model),
            brand: brand.to_string(),
            model: model.to_string(),
            category: ProductCategory::Phone,
            full_name: format!("{} {}", brand, model),
            first_mentioned: at,
            last_mentioned: at,
            mention_count: count,
            corrected: false,
            is_correction: false,
            color: None,
            url: None,
        }
    }

    #[test]
    fn components_add_up() {
        let now = Utc::now();
        let config = ContextConfig::default();
        let m = mention("Pixel", "8", 2, now - Duration::seconds(60));
        let recent: VecDeque<String> = ["the pixel 8 looks nice".to_string(), "ok".to_string()]
            .into_iter()
            .collect();
        // recency 15 - 2, mention 3, second newest message bonus 16
        let score = score_mention(&m, &recent, now, &config);
        assert!((score - (13.0 + 3.0 + 16.0)).abs() < 1e-9);
    }

    #[test]
    fn recency_and_mention_are_capped() {
        let now = Utc::now();
        let config = ContextConfig::default();
        let mut m = mention("iPhone", "15", 40, now - Duration::hours(2));
        m.is_correction = true;
        let score = score_mention(&m, &VecDeque::new(), now, &config);
        assert!((score - (0.0 + 15.0 + 25.0)).abs() < 1e-9);
    }

    #[test]
    fn word_boundaries_apply() {
        assert!(contains_word("my iphone broke", "iphone"));
        assert!(!contains_word("iphones everywhere", "iphone"));
        assert!(!contains_word("version 150", "15"));
        assert!(contains_word("the 15, I think", "15"));
    }

    #[test]
    fn ties_keep_first_inserted() {
        let now = Utc::now();
        let config = ContextConfig::default();
        let products = vec![mention("Pixel", "8", 1, now), mention("Pixel", "9", 1, now)];
        let (best, _) = best_mention(&products, &VecDeque::new(), now, &config).unwrap();
        assert_eq!(best.model, "8");
    }

    #[test]
    fn corrected_entries_are_skipped() {
        let now = Utc::now();
        let config = ContextConfig::default();
        let mut stale = mention("iPhone", "15", 9, now);
        stale.corrected = true;
        let products = vec![stale];
        assert!(best_mention(&products, &VecDeque::new(), now, &config).is_none());
    }
}
