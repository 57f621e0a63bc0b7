//! Joined message/handle/attachment/chat row as selected from the chat database.

use relay_core::{RawMessageRecord, RelayError};
use tracing::{info, warn};

use crate::text_extractor::extract_attributed_text;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub sender: String,
    pub text: Option<String>,
    pub attributed_body: Option<Vec<u8>>,
    pub attachment_name: Option<String>,
    pub service: Option<String>,
    pub timestamp: i64,
    pub mime_type: Option<String>,
    pub chat_guid: Option<String>,
}

impl MessageRow {
    /// Converts to a record, recovering text from `attributed_body` when the plain column is empty.
    pub fn into_record(self) -> RawMessageRecord {
        let plain = self.text.filter(|t| !t.trim().is_empty());
        let text = match (plain, self.attributed_body.as_deref()) {
            (Some(text), _) => Some(text),
            (None, Some(body)) => {
                let recovered = extract_attributed_text(body);
                match &recovered {
                    Some(text) => info!(id = self.id, text = %text, "Recovered text from attributedBody"),
                    None => warn!(
                        error = %RelayError::ExtractionFailure(self.id),
                        body_len = body.len(),
                        has_attachment = self.attachment_name.is_some(),
                        "Skipping unreadable attributedBody"
                    ),
                }
                recovered
            }
            (None, None) => None,
        };

        RawMessageRecord {
            id: self.id,
            sender: self.sender,
            text,
            attachment_name: self.attachment_name,
            service: self.service,
            timestamp: self.timestamp,
            mime_type: self.mime_type,
            chat_guid: self.chat_guid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: Option<&str>, body: Option<&[u8]>) -> MessageRow {
        MessageRow {
            id: 7,
            sender: "+15550001111".to_string(),
            text: text.map(String::from),
            attributed_body: body.map(<[u8]>::to_vec),
            attachment_name: None,
            service: Some("iMessage".to_string()),
            timestamp: 0,
            mime_type: None,
            chat_guid: None,
        }
    }

    #[test]
    fn plain_text_wins_over_body() {
        let record = row(Some("hello"), Some(b"\x00garbage\x00")).into_record();
        assert_eq!(record.text.as_deref(), Some("hello"));
    }

    #[test]
    fn blank_text_falls_back_to_body() {
        let body = b"\x84\x08NSString\x01\x94\x84\x01+\x0bhello there\x86\x84\x02iI\x01";
        let record = row(Some("  "), Some(body)).into_record();
        assert_eq!(record.text.as_deref(), Some("hello there"));
    }

    #[test]
    fn unreadable_body_yields_no_text() {
        let record = row(None, Some(b"\x00\x01\x02\x03")).into_record();
        assert_eq!(record.text, None);
        assert_eq!(record.id, 7);
    }
}
