//! Error types for the relay core.
//!
//! [`RelayError`] names every failure class the pipeline distinguishes. None of them is allowed
//! to abort the polling loop; see the dispatcher and runner for where each one is absorbed.

use thiserror::Error;

/// Failure taxonomy for ingestion, routing and collaborator calls.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Connection or query failure against the message store. Retried next poll; cursor unchanged.
    #[error("Message store unavailable: {0}")]
    StoreUnavailable(String),

    /// The binary rich-text payload yielded no candidate text.
    #[error("No text could be recovered from message {0}")]
    ExtractionFailure(i64),

    /// Attachment path could not be located under the attachments root.
    #[error("Attachment not found: {0}")]
    ResolutionFailure(String),

    /// Attachment type is not one the relay can hand to a collaborator.
    #[error("Unsupported attachment type: {0}")]
    ClassificationUnknown(String),

    /// Group rejected by the dedup guard. Skipped silently, never reported to the user.
    #[error("Duplicate group: {0}")]
    DuplicateGroup(String),

    /// An AI, search or transport collaborator returned an error.
    #[error("Collaborator {collaborator} failed: {message}")]
    CollaboratorFailure {
        collaborator: &'static str,
        message: String,
    },
}

impl RelayError {
    /// Wraps a collaborator error, keeping the full cause chain in the message.
    pub fn collaborator(collaborator: &'static str, err: anyhow::Error) -> Self {
        RelayError::CollaboratorFailure {
            collaborator,
            message: format!("{:#}", err),
        }
    }
}

/// Result type for core operations; uses [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_error_keeps_cause_chain() {
        let err = anyhow::anyhow!("connection reset").context("search request");
        let wrapped = RelayError::collaborator("web_search", err);
        assert_eq!(
            wrapped.to_string(),
            "Collaborator web_search failed: search request: connection reset"
        );
    }

    #[test]
    fn store_and_extraction_messages() {
        assert_eq!(
            RelayError::ExtractionFailure(7).to_string(),
            "No text could be recovered from message 7"
        );
        assert_eq!(
            RelayError::StoreUnavailable("database is locked".into()).to_string(),
            "Message store unavailable: database is locked"
        );
    }
}
