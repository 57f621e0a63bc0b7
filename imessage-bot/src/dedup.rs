//! Dedup guard: short-lived memory of recently handled groups.
//!
//! Overlapping poll windows and the store's own rewrites can deliver the same turn twice. A
//! group whose key was admitted less than `reject_within` ago is refused; entries older than
//! `evict_after` are swept on every call so the map stays bounded.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use relay_core::MessageGroup;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupConfig {
    pub reject_within: Duration,
    pub evict_after: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            reject_within: Duration::seconds(60),
            evict_after: Duration::seconds(300),
        }
    }
}

/// `group_key -> last admitted at`.
#[derive(Debug, Clone, Default)]
pub struct DedupGuard {
    config: DedupConfig,
    entries: HashMap<String, DateTime<Utc>>,
}

impl DedupGuard {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn admit(&mut self, group: &MessageGroup) -> bool {
        self.admit_at(group, Utc::now())
    }

    /// Admits `group` at `now`. A rejected group does not refresh its entry.
    pub fn admit_at(&mut self, group: &MessageGroup, now: DateTime<Utc>) -> bool {
        self.sweep(now);

        let key = group.group_key();
        if let Some(&last) = self.entries.get(&key) {
            let since = now - last;
            if since < self.config.reject_within {
                warn!(
                    group_key = %key,
                    seconds_since = since.num_milliseconds() as f64 / 1000.0,
                    "Skipping duplicate message group"
                );
                return false;
            }
        }

        self.entries.insert(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&mut self, now: DateTime<Utc>) {
        let evict_after = self.config.evict_after;
        let before = self.entries.len();
        self.entries.retain(|_, last| now - *last <= evict_after);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "Swept dedup entries");
        }
    }
}
