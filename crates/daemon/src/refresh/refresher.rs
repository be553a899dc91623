use std::sync::Arc;
use std::time::Duration;

use common::cache::{Clock, SecretMap, SystemClock};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use super::events::{RefreshEvent, RefreshReport};
use crate::source::{SecretSource, SourceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Time between the start of two cycles
    pub interval: Duration,
    /// Longest a single fetch may take
    pub fetch_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("fetch failed: {0}")]
    Source(#[from] SourceError),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Keeps a live [`SecretMap`] in step with a [`SecretSource`]
#[derive(Debug)]
pub struct Refresher {
    live: Arc<SecretMap>,
    source: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    config: RefreshConfig,
    subscribers: Mutex<Vec<flume::Sender<RefreshEvent>>>,
}

impl Refresher {
    pub fn new(live: Arc<SecretMap>, source: Arc<dyn SecretSource>, config: RefreshConfig) -> Self {
        Self {
            live,
            source,
            clock: Arc::new(SystemClock),
            config,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Stamp the entries of each new set with the given clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn live(&self) -> &Arc<SecretMap> {
        &self.live
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Receive an event after every cycle
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> flume::Receiver<RefreshEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Run a single cycle
    ///
    /// The live map is touched exactly once, by a single overwrite, and only
    /// if the whole set was fetched and decoded.
    pub async fn refresh_once(&self) -> Result<RefreshReport, RefreshError> {
        let fetched = tokio::time::timeout(self.config.fetch_timeout, self.source.fetch_all()).await;
        let secrets = match fetched {
            Ok(Ok(secrets)) => secrets,
            Ok(Err(e)) => return Err(self.fail(e.into())),
            Err(_) => return Err(self.fail(RefreshError::Timeout(self.config.fetch_timeout))),
        };

        let donor =
            SecretMap::with_clock_after(Arc::clone(&self.clock), self.live.last_modified());
        for secret in secrets {
            if secret.name.is_empty() {
                tracing::warn!("skipping secret without a name");
                continue;
            }
            donor.put(secret.name.clone(), secret);
        }

        let report = RefreshReport::between(&self.live.snapshot(), &donor.snapshot());
        self.live.overwrite(&donor);

        self.publish(RefreshEvent::Refreshed {
            report: report.clone(),
        });
        Ok(report)
    }

    /// Refresh on every tick until `shutdown` fires or its sender goes away
    ///
    /// The first cycle runs immediately. Failures are logged and the loop
    /// simply waits for the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh_once().await {
                        Ok(report) if report.is_unchanged() => {
                            tracing::debug!("refreshed {} secrets, no names changed", report.total);
                        }
                        Ok(report) => {
                            tracing::info!(
                                "refreshed {} secrets: {} added, {} removed",
                                report.total,
                                report.added.len(),
                                report.removed.len()
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "refresh failed, keeping {} cached secrets: {}",
                                self.live.len(),
                                e
                            );
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::debug!("refresher shutting down");
                    break;
                }
            }
        }
    }

    /// Run the refresh loop on the tokio runtime
    pub fn spawn(self) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });
        RefreshHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    fn fail(&self, error: RefreshError) -> RefreshError {
        self.publish(RefreshEvent::Failed {
            error: error.to_string(),
        });
        error
    }

    fn publish(&self, event: RefreshEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Handle to a spawned refresh loop
#[derive(Debug)]
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Ask the loop to stop after the current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }

    /// Shut down and wait for the loop to exit
    pub async fn stop(self) -> Result<(), JoinError> {
        self.shutdown();
        self.join().await
    }
}
