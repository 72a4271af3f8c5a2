//! Stops a detached validator once the app it serves goes away.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;

/// Consecutive failed probes before the validator is stopped.
pub const DEFAULT_MAX_FAILURES: u32 = 2;

/// Why [`AutoKiller::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillerOutcome {
    /// The app stopped answering.
    AppGone,
    Cancelled,
}

/// Periodic liveness poller.
#[derive(Debug, Clone)]
pub struct AutoKiller {
    interval: Duration,
    max_failures: u32,
}

impl AutoKiller {
    pub fn new(interval: Duration, max_failures: u32) -> Self {
        Self {
            interval,
            max_failures: max_failures.max(1),
        }
    }

    /// Probe every interval until `max_failures` probes in a row fail or
    /// `cancel` fires.
    pub async fn run<P, Fut>(&self, mut probe: P, mut cancel: broadcast::Receiver<()>) -> KillerOutcome
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let mut failures = 0;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if probe().await {
                        failures = 0;
                        continue;
                    }
                    failures += 1;
                    tracing::debug!(failures, max = self.max_failures, "App did not answer liveness probe");
                    if failures >= self.max_failures {
                        return KillerOutcome::AppGone;
                    }
                }
                _ = cancel.recv() => return KillerOutcome::Cancelled,
            }
        }
    }
}

/// Whether anything accepts TCP connections on `addr`.
pub async fn tcp_probe(addr: SocketAddr) -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}
