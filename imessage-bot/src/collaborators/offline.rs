//! Offline stand-in for every AI and search collaborator.
//!
//! Replies are generated locally so the relay runs end to end without a provider. Image
//! generation is the one capability with no local fallback and always errors.

use std::path::{Path, PathBuf};

use anyhow::bail;
use async_trait::async_trait;
use relay_core::{
    Assistant, AudioTranscriber, DocumentAnalyzer, ImageAnalyzer, ImageGenerator, SearchHints,
    SearchResult, SearchSummarizer, WebSearch,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct OfflineAssistant;

impl OfflineAssistant {
    pub fn new() -> Self {
        Self
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[async_trait]
impl Assistant for OfflineAssistant {
    async fn reply(&self, conversation: &str, text: &str) -> anyhow::Result<String> {
        debug!(conversation = %conversation, "Offline assistant reply");
        Ok(format!(
            "Got your message: \"{}\". No assistant is connected right now, so I can't answer yet.",
            text.trim()
        ))
    }
}

#[async_trait]
impl ImageAnalyzer for OfflineAssistant {
    async fn describe(&self, _conversation: &str, path: &Path, context: &str) -> anyhow::Result<String> {
        let mut reply = format!("I received your image ({}).", file_name(path));
        if !context.trim().is_empty() {
            reply.push_str(&format!(" You asked: \"{}\".", context.trim()));
        }
        reply.push_str(" Image analysis isn't connected right now.");
        Ok(reply)
    }
}

#[async_trait]
impl AudioTranscriber for OfflineAssistant {
    async fn transcribe(&self, _path: &Path) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

#[async_trait]
impl DocumentAnalyzer for OfflineAssistant {
    async fn analyze(&self, _conversation: &str, path: &Path, _context: &str) -> anyhow::Result<String> {
        Ok(format!(
            "I received your document ({}). Document analysis isn't connected right now.",
            file_name(path)
        ))
    }
}

#[async_trait]
impl ImageGenerator for OfflineAssistant {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<PathBuf> {
        bail!("no image generator configured")
    }
}

#[async_trait]
impl WebSearch for OfflineAssistant {
    async fn search(&self, query: &str, _conversation: &str) -> anyhow::Result<Vec<SearchResult>> {
        debug!(query = %query, "Offline search returns no results");
        Ok(Vec::new())
    }
}

#[async_trait]
impl SearchSummarizer for OfflineAssistant {
    async fn summarize(
        &self,
        query: &str,
        results: &[SearchResult],
        hints: &SearchHints,
    ) -> anyhow::Result<String> {
        if results.is_empty() {
            return Ok(match &hints.referent {
                Some(referent) => format!(
                    "I couldn't find anything for \"{}\" (about the {}).",
                    query, referent
                ),
                None => format!("I couldn't find anything for \"{}\".", query),
            });
        }
        let lines: Vec<String> = results
            .iter()
            .take(5)
            .enumerate()
            .map(|(i, r)| format!("{}. {}\n{}", i + 1, r.title, r.link))
            .collect();
        Ok(format!("Here's what I found for \"{}\":\n\n{}", query, lines.join("\n\n")))
    }
}
