//! # Dispatcher
//!
//! Turns one admitted [`MessageGroup`] into collaborator calls and a reply.
//!
//! ## States
//!
//! | state | meaning |
//! |-------|---------|
//! | `Grouped` | group handed in by the runner |
//! | `Deduped` | rejected by the [`DedupGuard`]; nothing is sent ([`DispatchOutcome::Duplicate`]) |
//! | `Admitted` | routed: attachments first, else text |
//! | route | [`Route`]: text, image, audio, document, URL payload, unsupported |
//! | terminal | [`Terminal::Responded`] or [`Terminal::Failed`] per route |
//!
//! ## Failure handling
//!
//! Every failure is absorbed here. Collaborator errors become
//! [`RelayError::CollaboratorFailure`], get logged, and the user receives a locally generated
//! apology; unresolvable and unsupported attachments get their own local messages. A stalled
//! collaborator call is abandoned after the configured timeout with a "still working" reply.
//! Nothing propagates to the polling loop.
//!
//! ## Context
//!
//! The user's text is recorded in the [`ContextStore`] before routing, so disambiguation while
//! handling the turn already sees it; each text reply is recorded afterwards as an assistant
//! message.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use memory::{ContextStore, MemoryRole};
use relay_core::{Collaborators, ContentKind, MessageGroup, RawMessageRecord, RelayError, ServiceKind};
use tracing::{debug, error, info, instrument, warn};

use crate::attachments::{classify, is_url_payload, AttachmentResolver};
use crate::dedup::DedupGuard;
use crate::gate::{self, SearchNeed};
use crate::waiter::{CollaboratorWaiter, Waited};

pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, something went wrong while handling your message. Please try again in a moment.";
pub const STILL_WORKING_MESSAGE: &str =
    "I'm still working on that one. It's taking longer than usual, please check back in a moment.";
pub const COULD_NOT_PROCESS_MESSAGE: &str =
    "I couldn't process that attachment. Please try sending it again.";
pub const COULD_NOT_TRANSCRIBE_MESSAGE: &str =
    "I couldn't transcribe that audio. Please try again with clearer audio.";
pub const COULD_NOT_ANALYZE_IMAGE_MESSAGE: &str =
    "I couldn't analyze that image. Please try again with a clearer image.";
pub const COULD_NOT_READ_DOCUMENT_MESSAGE: &str =
    "I couldn't extract text from that document. Please try again with a different document.";

/// User-facing list of what the relay can handle, for unsupported attachments.
pub fn capability_message(kind: &str) -> String {
    format!(
        "Oops! I can't process this {} file yet.\n\nI can work with:\n\
         Images: JPG, PNG, GIF, HEIC, WEBP\n\
         Documents: PDF, DOCX, XLSX, RTF, TXT\n\
         Audio: MP3, WAV, M4A, CAF, AIFF, and more\n\n\
         Want to try sending one of these instead?",
        kind
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Longest wait on any single collaborator call.
    pub collaborator_timeout: Duration,
    /// How often a pending call is reported in the log.
    pub progress_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout: Duration::from_secs(120),
            progress_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Text,
    Image,
    Audio,
    Document,
    /// Shared link: the payload attachment plus the URL text that came with it.
    Url,
    Unsupported,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Text => "text",
            Route::Image => "image",
            Route::Audio => "audio",
            Route::Document => "document",
            Route::Url => "url",
            Route::Unsupported => "unsupported",
        }
    }

    fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Image => Route::Image,
            ContentKind::Audio => Route::Audio,
            ContentKind::Document => Route::Document,
            ContentKind::Video | ContentKind::Unknown => Route::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Responded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOutcome {
    pub route: Route,
    pub terminal: Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Rejected by the dedup guard.
    Duplicate,
    /// No text and no attachment survived decoding.
    Empty,
    /// One outcome per route taken; text groups take exactly one.
    Dispatched(Vec<RouteOutcome>),
}

/// What a route produced for the user.
enum Reply {
    /// Collaborator text; recorded as the assistant's reply.
    Text(String),
    /// Generated file plus the note recorded in its place.
    File { path: PathBuf, note: String },
    /// Locally generated message; never recorded.
    Local(String),
}

/// Per-group facts every route needs.
struct Turn {
    sender: String,
    conversation: String,
    service: ServiceKind,
    text: String,
}

impl Turn {
    fn from_group(group: &MessageGroup) -> Self {
        Self {
            sender: group.sender().to_string(),
            conversation: group.conversation_key().to_string(),
            service: group.service(),
            text: group.combined_text(),
        }
    }
}

/// Owns the dedup guard, context store and attachment resolver; driven by the polling loop.
pub struct Dispatcher {
    collaborators: Collaborators,
    resolver: AttachmentResolver,
    dedup: DedupGuard,
    context: ContextStore,
    waiter: CollaboratorWaiter,
}

impl Dispatcher {
    pub fn new(
        collaborators: Collaborators,
        resolver: AttachmentResolver,
        dedup: DedupGuard,
        context: ContextStore,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            collaborators,
            resolver,
            dedup,
            context,
            waiter: CollaboratorWaiter::new(config.collaborator_timeout, config.progress_interval),
        }
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn dedup(&self) -> &DedupGuard {
        &self.dedup
    }

    pub fn resolver(&self) -> &AttachmentResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut AttachmentResolver {
        &mut self.resolver
    }

    /// Handles one group end to end. Never fails; see the module docs.
    #[instrument(skip(self, group), fields(sender = %group.sender(), records = group.len()))]
    pub async fn dispatch(&mut self, group: &MessageGroup) -> DispatchOutcome {
        if !self.dedup.admit(group) {
            debug!(error = %RelayError::DuplicateGroup(group.group_key()), "step: group skipped");
            return DispatchOutcome::Duplicate;
        }

        let turn = Turn::from_group(group);
        info!(
            conversation = %turn.conversation,
            service = %turn.service,
            has_attachment = group.has_attachment(),
            text_len = turn.text.len(),
            "step: dispatching message group"
        );

        if group.has_attachment() {
            return DispatchOutcome::Dispatched(self.dispatch_attachments(group, &turn).await);
        }

        if turn.text.is_empty() {
            warn!(group_key = %group.group_key(), "Message group has no text or attachment");
            return DispatchOutcome::Empty;
        }

        self.context.update(&turn.conversation, &turn.text);
        let result = self.text_route(&turn, &turn.text).await;
        DispatchOutcome::Dispatched(vec![self.finish(Route::Text, &turn, result).await])
    }

    async fn dispatch_attachments(&mut self, group: &MessageGroup, turn: &Turn) -> Vec<RouteOutcome> {
        if !turn.text.is_empty() {
            self.context.update(&turn.conversation, &turn.text);
        }

        let mut outcomes = Vec::new();
        let mut url_payload_seen = false;
        for record in group.records().iter().filter(|r| r.has_attachment()) {
            let name = record.attachment_name.as_deref().unwrap_or_default().trim();

            if is_url_payload(name) {
                if url_payload_seen {
                    info!(attachment = %name, "Skipping duplicate URL attachment in message group");
                    continue;
                }
                url_payload_seen = true;
                let (route, result) = self.url_route(turn, name).await;
                outcomes.push(self.finish(route, turn, result).await);
                continue;
            }

            let (route, result) = self.attachment_route(turn, record, name).await;
            outcomes.push(self.finish(route, turn, result).await);
        }
        outcomes
    }

    async fn url_route(&mut self, turn: &Turn, name: &str) -> (Route, Result<Reply, RelayError>) {
        let lower = turn.text.to_lowercase();
        if !(lower.contains("http://") || lower.contains("https://")) {
            warn!(attachment = %name, "URL attachment without link text");
            return (
                Route::Unsupported,
                Err(RelayError::ClassificationUnknown(ContentKind::Unknown.to_string())),
            );
        }
        let text = dedup_words(&turn.text);
        info!(text = %text, "step: routing shared link as text");
        (Route::Url, self.text_route(turn, &text).await)
    }

    async fn attachment_route(
        &mut self,
        turn: &Turn,
        record: &RawMessageRecord,
        name: &str,
    ) -> (Route, Result<Reply, RelayError>) {
        let mime = record.mime_type.as_deref();
        let Some(path) = self.resolver.resolve(name) else {
            let route = Route::for_kind(classify(Path::new(name), mime, name));
            return (route, Err(RelayError::ResolutionFailure(name.to_string())));
        };

        let kind = classify(&path, mime, name);
        let route = Route::for_kind(kind);
        info!(
            attachment = %name,
            path = %path.display(),
            kind = %kind,
            route = route.as_str(),
            "step: attachment classified"
        );

        let result = match route {
            Route::Image => {
                let call = self
                    .collaborators
                    .image_analyzer
                    .describe(&turn.conversation, &path, &turn.text);
                match self.call("image_analyzer", call).await {
                    Ok(Some(reply)) if reply.trim().is_empty() => {
                        Ok(Reply::Local(COULD_NOT_ANALYZE_IMAGE_MESSAGE.to_string()))
                    }
                    Ok(Some(reply)) => Ok(Reply::Text(reply)),
                    Ok(None) => Ok(still_working()),
                    Err(e) => Err(e),
                }
            }
            Route::Document => {
                let call = self
                    .collaborators
                    .document_analyzer
                    .analyze(&turn.conversation, &path, &turn.text);
                match self.call("document_analyzer", call).await {
                    Ok(Some(reply)) if reply.trim().is_empty() => {
                        Ok(Reply::Local(COULD_NOT_READ_DOCUMENT_MESSAGE.to_string()))
                    }
                    Ok(Some(reply)) => Ok(Reply::Text(reply)),
                    Ok(None) => Ok(still_working()),
                    Err(e) => Err(e),
                }
            }
            Route::Audio => self.audio_route(turn, &path).await,
            _ => Err(RelayError::ClassificationUnknown(kind.to_string())),
        };
        (route, result)
    }

    /// Transcribes, then handles the transcription exactly like typed text.
    async fn audio_route(&mut self, turn: &Turn, path: &Path) -> Result<Reply, RelayError> {
        let call = self.collaborators.transcriber.transcribe(path);
        let transcription = match self.call("audio_transcriber", call).await? {
            None => return Ok(still_working()),
            Some(t) => t.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        };
        let Some(text) = transcription else {
            return Ok(Reply::Local(COULD_NOT_TRANSCRIBE_MESSAGE.to_string()));
        };

        info!(transcription = %text, "step: audio transcribed");
        self.context.update(&turn.conversation, &text);
        self.text_route(turn, &text).await
    }

    /// Image intent, then search, then the conversational assistant.
    async fn text_route(&self, turn: &Turn, text: &str) -> Result<Reply, RelayError> {
        let collaborators = &self.collaborators;

        if gate::is_image_request(text) {
            info!(prompt = %text, "step: image generation request");
            let call = collaborators.image_generator.generate(text);
            return Ok(match self.call("image_generator", call).await? {
                Some(path) => Reply::File {
                    path,
                    note: format!("Generated an image for: {}", text),
                },
                None => still_working(),
            });
        }

        if self.needs_search(text).await {
            let query = gate::enhance_query(
                text,
                self.context.get(&turn.conversation),
                self.context.resolve_referent(&turn.conversation),
            );
            info!(query = %query, original = %text, "step: web search");

            let call = collaborators.search.search(&query, &turn.conversation);
            let Some(results) = self.call("web_search", call).await? else {
                return Ok(still_working());
            };
            debug!(result_count = results.len(), "Search results received");

            let hints = self.context.search_hints(&turn.conversation);
            let call = collaborators.summarizer.summarize(&query, &results, &hints);
            return Ok(match self.call("search_summarizer", call).await? {
                Some(summary) => Reply::Text(summary),
                None => still_working(),
            });
        }

        info!("step: conversational reply");
        let call = collaborators.assistant.reply(&turn.conversation, text);
        Ok(match self.call("assistant", call).await? {
            Some(reply) => Reply::Text(reply),
            None => still_working(),
        })
    }

    async fn needs_search(&self, text: &str) -> bool {
        match gate::search_need(text) {
            SearchNeed::Required => true,
            SearchNeed::Rejected => false,
            SearchNeed::Undecided => {
                let Some(advisor) = self.collaborators.advisor.as_ref() else {
                    return false;
                };
                match self.call("search_advisor", advisor.needs_search(text)).await {
                    Ok(Some(decision)) => decision,
                    Ok(None) => false,
                    Err(e) => {
                        warn!(error = %e, "Search advisor failed; answering without search");
                        false
                    }
                }
            }
        }
    }

    /// Bounded collaborator call. `Ok(None)` means it timed out.
    async fn call<T, F>(&self, collaborator: &'static str, fut: F) -> Result<Option<T>, RelayError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match self.waiter.wait(collaborator, fut).await {
            Waited::Ready(Ok(value)) => Ok(Some(value)),
            Waited::Ready(Err(e)) => Err(RelayError::collaborator(collaborator, e)),
            Waited::TimedOut => Ok(None),
        }
    }

    /// Delivers the route's reply, or the local message for its failure.
    async fn finish(
        &mut self,
        route: Route,
        turn: &Turn,
        result: Result<Reply, RelayError>,
    ) -> RouteOutcome {
        let terminal = match result {
            Ok(reply) => match self.deliver(turn, reply).await {
                Ok(()) => Terminal::Responded,
                Err(e) => {
                    error!(error = %e, route = route.as_str(), "Failed to deliver reply");
                    Terminal::Failed
                }
            },
            Err(err) => {
                let message = failure_message(&err);
                match &err {
                    RelayError::ClassificationUnknown(_) => {
                        warn!(error = %err, route = route.as_str(), "Unsupported attachment")
                    }
                    _ => error!(error = %err, route = route.as_str(), "Route failed"),
                }
                if let Err(e) = self.send_text(turn, &message).await {
                    error!(error = %e, "Failed to send failure notice");
                }
                Terminal::Failed
            }
        };
        info!(route = route.as_str(), terminal = ?terminal, "step: route finished");
        RouteOutcome { route, terminal }
    }

    async fn deliver(&mut self, turn: &Turn, reply: Reply) -> Result<(), RelayError> {
        match reply {
            Reply::Text(text) if text.trim().is_empty() => {
                warn!("Collaborator returned an empty reply");
                self.send_text(turn, APOLOGY_MESSAGE).await
            }
            Reply::Text(text) => {
                self.send_text(turn, &text).await?;
                self.context
                    .record(&turn.conversation, MemoryRole::Assistant, &text);
                Ok(())
            }
            Reply::File { path, note } => {
                let call = self
                    .collaborators
                    .sender
                    .send_file(&turn.sender, &path, &turn.service);
                self.call("message_sender", call)
                    .await?
                    .ok_or_else(|| send_timeout(self.waiter.timeout()))?;
                self.context
                    .record(&turn.conversation, MemoryRole::Assistant, &note);
                Ok(())
            }
            Reply::Local(text) => self.send_text(turn, &text).await,
        }
    }

    async fn send_text(&self, turn: &Turn, text: &str) -> Result<(), RelayError> {
        let call = self
            .collaborators
            .sender
            .send_text(&turn.sender, text, &turn.service);
        self.call("message_sender", call)
            .await?
            .ok_or_else(|| send_timeout(self.waiter.timeout()))
    }
}

fn still_working() -> Reply {
    Reply::Local(STILL_WORKING_MESSAGE.to_string())
}

fn send_timeout(waited: Duration) -> RelayError {
    RelayError::CollaboratorFailure {
        collaborator: "message_sender",
        message: format!("no confirmation after {}s", waited.as_secs()),
    }
}

/// Local message for a failed route; needs no collaborator.
fn failure_message(err: &RelayError) -> String {
    match err {
        RelayError::ResolutionFailure(_) => COULD_NOT_PROCESS_MESSAGE.to_string(),
        RelayError::ClassificationUnknown(kind) => capability_message(kind),
        _ => APOLOGY_MESSAGE.to_string(),
    }
}

/// Drops repeated words, keeping first occurrences in order.
fn dedup_words(text: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if !seen.contains(&word) {
            seen.push(word);
        }
    }
    seen.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_words_keeps_first_occurrence() {
        assert_eq!(
            dedup_words("look https://a.example.com https://a.example.com look"),
            "look https://a.example.com"
        );
    }

    #[test]
    fn failure_messages_are_local() {
        assert_eq!(
            failure_message(&RelayError::ResolutionFailure("x.png".into())),
            COULD_NOT_PROCESS_MESSAGE
        );
        assert!(failure_message(&RelayError::ClassificationUnknown("video".into()))
            .contains("can't process this video file"));
        assert_eq!(
            failure_message(&RelayError::CollaboratorFailure {
                collaborator: "assistant",
                message: "down".into()
            }),
            APOLOGY_MESSAGE
        );
    }

    #[test]
    fn routes_follow_content_kind() {
        assert_eq!(Route::for_kind(ContentKind::Image), Route::Image);
        assert_eq!(Route::for_kind(ContentKind::Video), Route::Unsupported);
        assert_eq!(Route::for_kind(ContentKind::Unknown), Route::Unsupported);
    }
}
