//! Built-in collaborators: outbound transports and an offline stand-in for the AI and search
//! services. Library users inject their own through [`crate::run_relay`].

mod log_sender;
mod offline;
mod osascript;

use std::sync::Arc;

use relay_core::{Collaborators, MessageSender};

pub use log_sender::LogSender;
pub use offline::OfflineAssistant;
pub use osascript::{apple_script_literal, OsaScriptSender};

/// Wires `sender` with [`OfflineAssistant`] for every AI and search role. No search advisor.
pub fn offline_collaborators(sender: Arc<dyn MessageSender>) -> Collaborators {
    let offline = Arc::new(OfflineAssistant::new());
    Collaborators {
        sender,
        assistant: offline.clone(),
        image_analyzer: offline.clone(),
        transcriber: offline.clone(),
        document_analyzer: offline.clone(),
        image_generator: offline.clone(),
        search: offline.clone(),
        summarizer: offline,
        advisor: None,
    }
}
