//! Dry-run transport: logs outbound messages instead of sending them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::{MessageSender, ServiceKind};
use tracing::info;

/// Records every outbound message in the log and in memory.
#[derive(Debug, Clone, Default)]
pub struct LogSender {
    sent: Arc<Mutex<Vec<String>>>,
}

impl LogSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far, as `recipient: text` or `recipient: <file path>`.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(line);
        }
    }
}

#[async_trait]
impl MessageSender for LogSender {
    async fn send_text(&self, recipient: &str, text: &str, service: &ServiceKind) -> anyhow::Result<()> {
        info!(recipient = %recipient, service = %service, text = %text, "Dry run: message not sent");
        self.push(format!("{}: {}", recipient, text));
        Ok(())
    }

    async fn send_file(&self, recipient: &str, path: &Path, service: &ServiceKind) -> anyhow::Result<()> {
        info!(recipient = %recipient, service = %service, path = %path.display(), "Dry run: file not sent");
        self.push(format!("{}: <{}>", recipient, path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_texts_and_files() {
        let sender = LogSender::new();
        sender
            .send_text("+15550001111", "hi", &ServiceKind::IMessage)
            .await
            .unwrap();
        sender
            .send_file("+15550001111", Path::new("/tmp/a.png"), &ServiceKind::Sms)
            .await
            .unwrap();
        assert_eq!(
            sender.sent(),
            vec!["+15550001111: hi", "+15550001111: </tmp/a.png>"]
        );
    }
}
