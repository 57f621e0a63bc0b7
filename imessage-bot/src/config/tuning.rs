//! Pipeline tuning: the empirically chosen windows, thresholds and weights, as overridable
//! defaults.

use std::time::Duration;

use memory::ContextConfig;

use crate::attachments::ResolverConfig;
use crate::dedup::DedupConfig;
use crate::dispatcher::DispatcherConfig;
use crate::grouper::GroupingWindows;

#[derive(Debug, Clone, Default)]
pub struct PipelineTuning {
    pub grouping: GroupingWindows,
    pub dedup: DedupConfig,
    pub context: ContextConfig,
    pub resolver: ResolverConfig,
    pub dispatcher: DispatcherConfig,
}

impl PipelineTuning {
    /// Defaults with the given collaborator timeout.
    pub fn with_collaborator_timeout(timeout: Duration) -> Self {
        let mut tuning = Self::default();
        tuning.dispatcher.collaborator_timeout = timeout;
        tuning
    }
}
