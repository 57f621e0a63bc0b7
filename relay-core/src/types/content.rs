//! Coarse attachment content type.

use serde::{Deserialize, Serialize};

/// Content type assigned to an attachment by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Image,
    Audio,
    Document,
    Video,
    Unknown,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Audio => "audio",
            ContentKind::Document => "document",
            ContentKind::Video => "video",
            ContentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
