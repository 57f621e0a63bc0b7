//! One decoded row from the message store.

use serde::{Deserialize, Serialize};

use super::service::ServiceKind;

/// Seconds between the Unix epoch and the store's epoch (2001-01-01T00:00:00Z).
pub const APPLE_EPOCH_OFFSET_SECS: i64 = 978_307_200;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A single incoming message as read from the store. `id` is the progress watermark.
///
/// `text` already holds text recovered from the binary payload when the plain column was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessageRecord {
    pub id: i64,
    pub sender: String,
    pub text: Option<String>,
    pub attachment_name: Option<String>,
    pub service: Option<String>,
    /// Store-native timestamp: nanoseconds since 2001-01-01.
    pub timestamp: i64,
    pub mime_type: Option<String>,
    pub chat_guid: Option<String>,
}

impl RawMessageRecord {
    /// Text-only record; handy for building groups by hand.
    pub fn text(id: i64, sender: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            sender: sender.into(),
            text: Some(text.into()),
            attachment_name: None,
            service: Some(ServiceKind::IMessage.as_str().to_string()),
            timestamp,
            mime_type: None,
            chat_guid: None,
        }
    }

    /// Converts the store-native timestamp to Unix seconds.
    pub fn unix_seconds(&self) -> f64 {
        self.timestamp as f64 / NANOS_PER_SEC + APPLE_EPOCH_OFFSET_SECS as f64
    }

    /// Non-empty trimmed text, if any.
    pub fn text_content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    pub fn service_kind(&self) -> Option<ServiceKind> {
        self.service.as_deref().map(ServiceKind::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_converts_nanosecond_epoch() {
        let rec = RawMessageRecord::text(1, "a", "hi", 30_000_000_000);
        assert!((rec.unix_seconds() - (APPLE_EPOCH_OFFSET_SECS as f64 + 30.0)).abs() < 1e-6);
    }

    #[test]
    fn blank_text_is_not_content() {
        let rec = RawMessageRecord::text(1, "a", "   ", 0);
        assert_eq!(rec.text_content(), None);
        assert!(!rec.has_attachment());
    }
}
