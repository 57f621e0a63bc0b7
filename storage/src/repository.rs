//! Source abstraction for the polling loop.

use async_trait::async_trait;
use relay_core::RawMessageRecord;

/// Anything the runner can poll for new incoming records.
///
/// `poll` never fails: store errors are logged by the implementation and surface as an empty
/// batch, leaving the cursor where it was.
#[async_trait]
pub trait MessageSource: Send {
    async fn poll(&mut self) -> Vec<RawMessageRecord>;
}
