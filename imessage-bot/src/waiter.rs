//! Bounded wait on a collaborator call with periodic progress logging.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{info, warn};

/// Result of [`CollaboratorWaiter::wait`].
#[derive(Debug, PartialEq, Eq)]
pub enum Waited<T> {
    Ready(T),
    /// The call did not finish within the timeout and was dropped.
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct CollaboratorWaiter {
    timeout: Duration,
    progress_interval: Duration,
}

impl CollaboratorWaiter {
    pub fn new(timeout: Duration, progress_interval: Duration) -> Self {
        Self {
            timeout,
            progress_interval: progress_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Polls `fut` until it completes or the timeout elapses, logging every progress interval.
    pub async fn wait<F>(&self, collaborator: &'static str, fut: F) -> Waited<F::Output>
    where
        F: Future,
    {
        tokio::pin!(fut);
        let started = Instant::now();
        loop {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!(
                    collaborator,
                    waited_secs = started.elapsed().as_secs_f64(),
                    "Collaborator call timed out"
                );
                return Waited::TimedOut;
            }
            match timeout(remaining.min(self.progress_interval), &mut fut).await {
                Ok(output) => return Waited::Ready(output),
                Err(_) => info!(
                    collaborator,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "step: still waiting for collaborator"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_ready_output() {
        let waiter = CollaboratorWaiter::new(Duration::from_secs(1), Duration::from_millis(10));
        let out = waiter.wait("assistant", async { 7 }).await;
        assert_eq!(out, Waited::Ready(7));
    }

    #[tokio::test]
    async fn survives_progress_ticks() {
        let waiter = CollaboratorWaiter::new(Duration::from_secs(2), Duration::from_millis(5));
        let out = waiter
            .wait("assistant", async {
                tokio::time::sleep(Duration::from_millis(40)).await;
                "done"
            })
            .await;
        assert_eq!(out, Waited::Ready("done"));
    }

    #[tokio::test]
    async fn times_out_on_stalled_call() {
        let waiter = CollaboratorWaiter::new(Duration::from_millis(30), Duration::from_millis(10));
        let out = waiter.wait("assistant", std::future::pending::<()>()).await;
        assert_eq!(out, Waited::TimedOut);
    }
}
