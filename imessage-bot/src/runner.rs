use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use memory::ContextStore;
use relay_core::{init_tracing, Collaborators};
use storage::{ChatDbReader, MessageSource};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::attachments::AttachmentResolver;
use crate::config::RelayConfig;
use crate::dedup::DedupGuard;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::grouper::{group_messages, GroupingWindows};

/// Polling loop: poll → group → (dedup → dispatch)* → sleep. Owns the source cursor and the
/// dispatcher's dedup, context and resolver state; nothing else mutates them.
pub struct Relay<S> {
    source: S,
    dispatcher: Dispatcher,
    windows: GroupingWindows,
    poll_interval: Duration,
    group_pause: Duration,
    /// `None` keeps resolved attachment paths for the life of the process.
    cache_refresh: Option<Duration>,
    last_cache_refresh: Instant,
}

impl<S: MessageSource> Relay<S> {
    pub fn new(
        source: S,
        dispatcher: Dispatcher,
        windows: GroupingWindows,
        poll_interval: Duration,
        group_pause: Duration,
    ) -> Self {
        Self {
            source,
            dispatcher,
            windows,
            poll_interval,
            group_pause,
            cache_refresh: None,
            last_cache_refresh: Instant::now(),
        }
    }

    /// Forget resolved attachment paths every `every`, checked after each cycle. Zero disables.
    pub fn with_cache_refresh(mut self, every: Duration) -> Self {
        self.cache_refresh = (!every.is_zero()).then_some(every);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One poll cycle without sleeping; returns one outcome per group.
    pub async fn run_cycle(&mut self) -> Vec<DispatchOutcome> {
        let never = std::future::pending::<()>();
        tokio::pin!(never);
        let outcomes = self.cycle(never).await.unwrap_or_default();
        self.refresh_attachment_cache(Instant::now());
        outcomes
    }

    /// Clears the attachment path cache once the refresh period has passed since the last
    /// clear; returns the number of evicted paths when it ran.
    pub fn refresh_attachment_cache(&mut self, now: Instant) -> Option<usize> {
        let every = self.cache_refresh?;
        if now.saturating_duration_since(self.last_cache_refresh) < every {
            return None;
        }
        self.last_cache_refresh = now;
        Some(self.dispatcher.resolver_mut().clear_cache())
    }

    /// Runs cycles until `shutdown` resolves. Shutdown is honoured while waiting on the store,
    /// between groups and during the sleep; an in-flight dispatch is dropped and logged.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "step: polling loop started"
        );
        loop {
            if self.cycle(shutdown.as_mut()).await.is_none() {
                break;
            }
            self.refresh_attachment_cache(Instant::now());
            tokio::select! {
                biased;
                _ = shutdown.as_mut() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }
        info!("step: polling loop stopped");
    }

    /// `None` once `shutdown` has resolved; it must not be polled again after that.
    async fn cycle<F>(&mut self, mut shutdown: Pin<&mut F>) -> Option<Vec<DispatchOutcome>>
    where
        F: Future<Output = ()>,
    {
        let batch = tokio::select! {
            biased;
            _ = shutdown.as_mut() => return None,
            batch = self.source.poll() => batch,
        };
        if batch.is_empty() {
            return Some(Vec::new());
        }

        info!(record_count = batch.len(), "step: received new messages");
        let groups = group_messages(batch, &self.windows);
        let mut outcomes = Vec::with_capacity(groups.len());

        for (index, group) in groups.iter().enumerate() {
            if index > 0 && !self.group_pause.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown.as_mut() => {
                        warn!(skipped_groups = groups.len() - index, "Shutdown requested; remaining groups not dispatched");
                        return None;
                    }
                    _ = sleep(self.group_pause) => {}
                }
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    warn!(
                        group_key = %group.group_key(),
                        skipped_groups = groups.len() - index - 1,
                        "Shutdown requested; in-flight dispatch interrupted, reply may be partial"
                    );
                    return None;
                }
                outcome = self.dispatcher.dispatch(group) => outcome,
            };
            debug!(group_key = %group.group_key(), outcome = ?outcome, "Group dispatched");
            outcomes.push(outcome);
        }
        Some(outcomes)
    }
}

/// Builds the dispatcher and loop for `source` from config.
pub fn build_relay<S: MessageSource>(
    source: S,
    config: &RelayConfig,
    collaborators: Collaborators,
) -> Relay<S> {
    let tuning = config.tuning();
    let dispatcher = Dispatcher::new(
        collaborators,
        AttachmentResolver::new(config.attachments_dir(), tuning.resolver),
        DedupGuard::new(tuning.dedup),
        ContextStore::new(tuning.context.clone()),
        tuning.dispatcher,
    );
    Relay::new(
        source,
        dispatcher,
        tuning.grouping,
        config.poll_interval(),
        config.group_pause(),
    )
    .with_cache_refresh(config.attachment_cache_refresh())
}

/// Resolves on ctrl-c or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Main entry: validate config, init logging, open the store, create collaborators via
/// factory, then poll until ctrl-c or SIGTERM.
/// The factory receives the config and returns the collaborators (AI, search, transport).
#[instrument(skip(config, make_collaborators))]
pub async fn run_relay<F>(config: RelayConfig, make_collaborators: F) -> Result<()>
where
    F: FnOnce(&RelayConfig) -> Collaborators,
{
    config.validate()?;
    init_tracing(config.log_file())?;

    info!(
        chat_db = %config.chat_db_path().display(),
        attachments_dir = %config.attachments_dir().display(),
        dry_run = config.dry_run(),
        "Initializing relay"
    );

    let reader = ChatDbReader::open(config.chat_db_path(), config.store_busy_timeout()).await?;
    let collaborators = make_collaborators(&config);
    let mut relay = build_relay(reader, &config, collaborators);

    info!("Relay started successfully");
    relay.run_until(shutdown_signal()).await;
    Ok(())
}
