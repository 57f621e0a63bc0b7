//! Logical conversational turn: consecutive records from one sender.

use serde::{Deserialize, Serialize};

use super::{record::RawMessageRecord, service::ServiceKind};

/// Non-empty ordered sequence of records sharing one sender. Built by the grouper, consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageGroup {
    records: Vec<RawMessageRecord>,
}

impl MessageGroup {
    pub fn new(first: RawMessageRecord) -> Self {
        Self {
            records: vec![first],
        }
    }

    pub fn push(&mut self, record: RawMessageRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RawMessageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> &RawMessageRecord {
        &self.records[0]
    }

    pub fn last(&self) -> &RawMessageRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn sender(&self) -> &str {
        &self.first().sender
    }

    /// `sender + first timestamp`; identifies the turn for the dedup guard.
    pub fn group_key(&self) -> String {
        format!("{}_{}", self.first().sender, self.first().timestamp)
    }

    /// All non-empty texts, space-joined.
    pub fn combined_text(&self) -> String {
        self.records
            .iter()
            .filter_map(RawMessageRecord::text_content)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_attachment(&self) -> bool {
        self.records.iter().any(RawMessageRecord::has_attachment)
    }

    /// Service of the first record that carries one; iMessage otherwise.
    pub fn service(&self) -> ServiceKind {
        self.records
            .iter()
            .find_map(RawMessageRecord::service_kind)
            .unwrap_or_default()
    }

    pub fn chat_guid(&self) -> Option<&str> {
        self.records.iter().find_map(|r| r.chat_guid.as_deref())
    }

    /// Key for the context store: chat GUID, else the sender handle.
    pub fn conversation_key(&self) -> &str {
        self.chat_guid().unwrap_or_else(|| self.sender())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, text: Option<&str>, service: Option<&str>) -> RawMessageRecord {
        RawMessageRecord {
            id,
            sender: "+15550001111".to_string(),
            text: text.map(String::from),
            attachment_name: None,
            service: service.map(String::from),
            timestamp: 1_000 + id,
            mime_type: None,
            chat_guid: None,
        }
    }

    #[test]
    fn combined_text_skips_empty_records() {
        let mut group = MessageGroup::new(record(1, Some("hello"), None));
        group.push(record(2, None, None));
        group.push(record(3, Some("  "), None));
        group.push(record(4, Some("world"), None));
        assert_eq!(group.combined_text(), "hello world");
        assert_eq!(group.group_key(), "+15550001111_1001");
    }

    #[test]
    fn service_defaults_to_imessage_and_uses_first_present() {
        let group = MessageGroup::new(record(1, Some("a"), None));
        assert_eq!(group.service(), ServiceKind::IMessage);

        let mut group = MessageGroup::new(record(1, Some("a"), None));
        group.push(record(2, Some("b"), Some("SMS")));
        assert_eq!(group.service(), ServiceKind::Sms);
    }

    #[test]
    fn conversation_key_falls_back_to_sender() {
        let mut rec = record(1, Some("a"), None);
        let group = MessageGroup::new(rec.clone());
        assert_eq!(group.conversation_key(), "+15550001111");
        rec.chat_guid = Some("iMessage;-;+15550001111".to_string());
        let group = MessageGroup::new(rec);
        assert_eq!(group.conversation_key(), "iMessage;-;+15550001111");
    }
}
