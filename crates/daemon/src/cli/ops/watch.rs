use std::fmt;

use clap::Args;
use tokio::task::JoinError;

use secretfs_daemon::RefreshEvent;

use crate::cli::op::{Op, OpContext};

/// Keep the cache refreshed until interrupted
#[derive(Args, Debug, Clone)]
pub struct Watch {}

#[derive(Debug, Default)]
pub struct WatchOutput {
    pub refreshes: usize,
    pub failures: usize,
}

impl fmt::Display for WatchOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stopped after {} refreshes ({} failed)",
            self.refreshes + self.failures,
            self.failures
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to listen for interrupt: {0}")]
    Signal(#[from] std::io::Error),
    #[error("refresh task failed: {0}")]
    Join(#[from] JoinError),
}

#[async_trait::async_trait]
impl Op for Watch {
    type Error = WatchError;
    type Output = WatchOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let refresher = ctx.refresher();
        tracing::info!(
            "watching {:?} every {}s",
            ctx.config.source_path,
            refresher.config().interval.as_secs()
        );

        let events = refresher.subscribe();
        let handle = refresher.spawn();
        let mut output = WatchOutput::default();

        loop {
            tokio::select! {
                event = events.recv_async() => match event {
                    Ok(RefreshEvent::Refreshed { report }) => {
                        output.refreshes += 1;
                        if !report.removed.is_empty() {
                            ctx.fs.forget_stale();
                        }
                        tracing::debug!("{} secrets visible", report.total);
                    }
                    Ok(RefreshEvent::Failed { error }) => {
                        output.failures += 1;
                        tracing::debug!("serving last good set after failure: {}", error);
                    }
                    Err(_) => break,
                },
                interrupted = tokio::signal::ctrl_c() => {
                    interrupted?;
                    tracing::info!("interrupted, stopping");
                    break;
                }
            }
        }

        handle.stop().await?;
        Ok(output)
    }
}
