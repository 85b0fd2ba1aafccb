//! Local fallback countdown shown while the job waits for browser
//! authentication and the server does not report the elapsed time itself.

use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct TimerHandle {
    cancel: CancellationToken,
    elapsed: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

/// At most one ticker runs at a time. Purely cosmetic: nothing in job control
/// reads it.
pub struct AuthWaitTimer {
    tick: Duration,
    handle: Option<TimerHandle>,
}

impl AuthWaitTimer {
    pub fn new(tick: Duration) -> Self {
        Self { tick, handle: None }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts a fresh count from zero. No-op (returns `false`) if one is already running.
    pub fn start(&mut self) -> bool {
        if self.handle.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let (tx, elapsed) = watch::channel(0);
        let task = tokio::spawn(run_ticker(self.tick, cancel.clone(), tx));
        debug!(tick_ms = self.tick.as_millis() as u64, "Auth wait timer started");

        self.handle = Some(TimerHandle {
            cancel,
            elapsed,
            task,
        });
        true
    }

    /// Cancels the ticker and drops the handle. No-op (returns `false`) if none is running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.cancel.cancel();
                handle.task.abort();
                debug!("Auth wait timer stopped");
                true
            }
            None => false,
        }
    }

    /// Resolves with the new count on the next tick; never resolves while stopped.
    pub async fn next_tick(&mut self) -> u64 {
        let Some(handle) = self.handle.as_mut() else {
            return pending().await;
        };
        match handle.elapsed.changed().await {
            Ok(()) => *handle.elapsed.borrow_and_update(),
            Err(_) => pending().await,
        }
    }
}

impl Drop for AuthWaitTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticker(tick: Duration, cancel: CancellationToken, tx: watch::Sender<u64>) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut elapsed: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                elapsed = elapsed.saturating_add(1);
                if tx.send(elapsed).is_err() {
                    break;
                }
            }
        }
    }
}
