//! External collaborator traits.
//!
//! The relay never talks to an AI provider, search engine or transport directly; the
//! dispatcher delegates through these traits. Implementations own their own retries and rate
//! limits and report failures as `anyhow::Error`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{SearchHints, SearchResult, ServiceKind};

/// Outbound transport. Delivers text or a file to a recipient handle.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, recipient: &str, text: &str, service: &ServiceKind)
        -> anyhow::Result<()>;

    async fn send_file(&self, recipient: &str, path: &Path, service: &ServiceKind)
        -> anyhow::Result<()>;
}

/// General-purpose conversational completion.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, conversation: &str, text: &str) -> anyhow::Result<String>;
}

/// Vision: describes or answers a question about an image.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// `context` is the text sent alongside the image; may be empty.
    async fn describe(&self, conversation: &str, path: &Path, context: &str)
        -> anyhow::Result<String>;
}

/// Speech to text. `Ok(None)` means the audio held no recognisable speech.
#[async_trait]
pub trait AudioTranscriber: Send + Sync {
    async fn transcribe(&self, path: &Path) -> anyhow::Result<Option<String>>;
}

/// Reads a document (PDF, DOCX, XLSX, RTF, TXT) and answers about it.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, conversation: &str, path: &Path, context: &str)
        -> anyhow::Result<String>;
}

/// Image generation; returns the path of the generated file.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<PathBuf>;
}

/// Web search provider; returns ranked results.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, conversation: &str) -> anyhow::Result<Vec<SearchResult>>;
}

/// Turns search results into the user-facing reply.
#[async_trait]
pub trait SearchSummarizer: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        results: &[SearchResult],
        hints: &SearchHints,
    ) -> anyhow::Result<String>;
}

/// Model-backed confirmation for queries the deterministic gate leaves undecided.
#[async_trait]
pub trait SearchAdvisor: Send + Sync {
    async fn needs_search(&self, query: &str) -> anyhow::Result<bool>;
}

/// The full set of collaborators handed to the dispatcher.
#[derive(Clone)]
pub struct Collaborators {
    pub sender: Arc<dyn MessageSender>,
    pub assistant: Arc<dyn Assistant>,
    pub image_analyzer: Arc<dyn ImageAnalyzer>,
    pub transcriber: Arc<dyn AudioTranscriber>,
    pub document_analyzer: Arc<dyn DocumentAnalyzer>,
    pub image_generator: Arc<dyn ImageGenerator>,
    pub search: Arc<dyn WebSearch>,
    pub summarizer: Arc<dyn SearchSummarizer>,
    /// Without an advisor, undecided queries are not searched.
    pub advisor: Option<Arc<dyn SearchAdvisor>>,
}
