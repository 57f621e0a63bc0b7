//! Relay configuration: BaseConfig (store, attachments, log, loop timing) + PipelineTuning
//! (grouping, dedup, context scoring, resolver and collaborator limits).

mod base;
mod relay_config;
mod tuning;


pub use base::{expand_home, BaseConfig};
pub use relay_config::RelayConfig;
pub use tuning::PipelineTuning;
