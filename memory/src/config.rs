//! Tunables for the context store.
//!
//! The defaults are the calibrated constants; none of them is a correctness invariant.

/// Capacity and scoring weights for [`crate::ContextStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Recent messages kept per conversation; the oldest is evicted on overflow.
    pub capacity: usize,
    /// Recency score of a mention made just now.
    pub recency_max: f64,
    /// Seconds per point of recency decay.
    pub recency_decay_secs: f64,
    pub mention_weight: f64,
    pub mention_cap: f64,
    pub correction_bonus: f64,
    /// Bonus when brand or model appears in the 1st, 2nd, ... most recent message.
    pub recent_message_bonuses: Vec<f64>,
    /// Added to `mention_count` of a mention introduced as a correction.
    pub correction_mention_bonus: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            recency_max: 15.0,
            recency_decay_secs: 30.0,
            mention_weight: 1.5,
            mention_cap: 15.0,
            correction_bonus: 25.0,
            recent_message_bonuses: vec![20.0, 16.0, 12.0, 8.0, 4.0],
            correction_mention_bonus: 2,
        }
    }
}
