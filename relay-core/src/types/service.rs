//! Transport service of a stored message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Service a message travelled over. Unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    IMessage,
    Sms,
    Other(String),
}

impl ServiceKind {
    /// Parses the store's service column. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "imessage" => ServiceKind::IMessage,
            "sms" => ServiceKind::Sms,
            _ => ServiceKind::Other(raw.trim().to_string()),
        }
    }

    pub fn is_sms(&self) -> bool {
        matches!(self, ServiceKind::Sms)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceKind::IMessage => "iMessage",
            ServiceKind::Sms => "SMS",
            ServiceKind::Other(name) => name,
        }
    }
}

impl Default for ServiceKind {
    fn default() -> Self {
        ServiceKind::IMessage
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_and_unknown_services() {
        assert_eq!(ServiceKind::parse("iMessage"), ServiceKind::IMessage);
        assert_eq!(ServiceKind::parse("SMS"), ServiceKind::Sms);
        assert_eq!(ServiceKind::parse("sms"), ServiceKind::Sms);
        assert_eq!(
            ServiceKind::parse("RCS"),
            ServiceKind::Other("RCS".to_string())
        );
        assert_eq!(ServiceKind::parse("RCS").to_string(), "RCS");
    }
}
