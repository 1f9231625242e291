use super::types::EXIT_SIGNAL_FORCED;
use super::Lifecycle;
use crate::error::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Source of "graceful shutdown requested" notifications
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Wait for the next notification. `None` means no more will arrive.
    async fn recv(&mut self) -> Option<String>;
}

/// SIGINT (Ctrl+C) and, on unix, SIGTERM
pub struct OsSignals {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl OsSignals {
    pub fn new() -> Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            sigterm: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<String> {
        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => result.ok().map(|()| "SIGINT".to_string()),
                received = self.sigterm.recv() => received.map(|()| "SIGTERM".to_string()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .ok()
                .map(|()| "SIGINT".to_string())
        }
    }
}

impl Lifecycle {
    /// Shut down when `source` delivers its first notification.
    ///
    /// The shutdown runs on its own task. If it has not finished within the configured bound the
    /// process is terminated; a second notification terminates it without waiting any longer.
    pub fn monitor_signals<S: SignalSource>(&self, mut source: S) -> JoinHandle<()> {
        let life = self.clone();
        tokio::spawn(async move {
            let Some(signal) = source.recv().await else {
                return;
            };
            info!("Receive {} signal, start shutdown", signal);

            let shutdown = {
                let life = life.clone();
                tokio::spawn(async move { life.shutdown().await })
            };
            let bound = life.inner.config.shutdown_timeout();

            tokio::select! {
                joined = shutdown => match joined {
                    Ok(Ok(())) => info!("Signal-driven shutdown complete"),
                    Ok(Err(e)) => error!("Signal-driven shutdown failed: {}", e),
                    Err(e) => error!("Signal-driven shutdown task failed: {}", e),
                },
                _ = tokio::time::sleep(bound) => {
                    warn!("Shutdown timeout after {:?}", bound);
                    life.inner.terminator.exit(EXIT_SIGNAL_FORCED);
                }
                Some(again) = source.recv() => {
                    error!("Receive {} again, exit immediately", again);
                    life.inner.terminator.exit(EXIT_SIGNAL_FORCED);
                }
            }
        })
    }
}
