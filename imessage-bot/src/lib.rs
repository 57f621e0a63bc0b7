//! # iMessage relay application
//!
//! Wires storage (chat database polling), memory (conversation context) and the collaborator
//! traits from relay-core into a polling loop: poll → group → dedup → dispatch → reply.
//! Loads config from env and runs until ctrl-c or SIGTERM.

pub mod attachments;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod gate;
pub mod grouper;
pub mod runner;
pub mod waiter;

pub use cli::{load_config, Cli, Commands};

pub use attachments::{classify, is_url_payload, AttachmentResolver, ResolverConfig};
pub use collaborators::{offline_collaborators, LogSender, OfflineAssistant, OsaScriptSender};
pub use config::{BaseConfig, PipelineTuning, RelayConfig};
pub use dedup::{DedupConfig, DedupGuard};
pub use dispatcher::{
    DispatchOutcome, Dispatcher, DispatcherConfig, Route, RouteOutcome, Terminal,
};
pub use gate::{enhance_query, search_need, SearchNeed};
pub use grouper::{group_messages, GroupingWindows};
pub use runner::{build_relay, run_relay, shutdown_signal, Relay};
pub use waiter::{CollaboratorWaiter, Waited};
