//! Status and log polling. Both loops start only after the readiness probe
//! answers and keep running through any fetch failure until cancelled.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{JobApiClient, LogEntry};
use crate::config::Config;
use crate::types::WizardError;
use crate::wizard::StatusSnapshot;

/// Latest-value feeds; `None` until the first successful fetch.
pub struct PollFeeds {
    pub status: watch::Receiver<Option<StatusSnapshot>>,
    pub logs: watch::Receiver<Option<Vec<LogEntry>>>,
}

pub struct Poller {
    api: JobApiClient,
    status_every: Duration,
    logs_every: Duration,
}

impl Poller {
    pub fn new(api: JobApiClient, config: &Config) -> Self {
        Self {
            api,
            status_every: config.status_poll_interval(),
            logs_every: config.logs_poll_interval(),
        }
    }

    /// Probe `/api/test`, then spawn both loops. Nothing is spawned if the
    /// probe fails.
    pub async fn start(self, cancel: CancellationToken) -> Result<PollFeeds, WizardError> {
        self.api.probe().await?;
        info!(api = %self.api.base_url(), "Job service ready, polling started");

        let (status_tx, status) = watch::channel(None);
        let (logs_tx, logs) = watch::channel(None);

        let api = self.api.clone();
        tokio::spawn(poll_loop(
            "status",
            self.status_every,
            cancel.clone(),
            status_tx,
            move || {
                let api = api.clone();
                async move { api.status().await }
            },
        ));

        let api = self.api;
        tokio::spawn(poll_loop(
            "logs",
            self.logs_every,
            cancel,
            logs_tx,
            move || {
                let api = api.clone();
                async move { api.logs().await }
            },
        ));

        Ok(PollFeeds { status, logs })
    }
}

async fn poll_loop<T, F, Fut>(
    name: &'static str,
    every: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<Option<T>>,
    mut fetch: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WizardError>>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = fetch() => result,
        };

        match result {
            Ok(value) => {
                tx.send_replace(Some(value));
            }
            Err(err) => warn!(poll = name, error = ?err, "Poll failed, retrying on next tick"),
        }
    }
    debug!(poll = name, "Poll loop stopped");
}
