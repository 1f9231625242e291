use super::component::Component;
use super::fault::{callback_phase, invoke, Fault};
use super::resolver::sort_by_dependency;
use super::runtime::OsSignals;
use super::state::Core;
use super::types::{HookEvent, Phase, EXIT_START_FAILED};
use super::Lifecycle;
use crate::error::{LifeError, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

impl Lifecycle {
    /// Start all registered components in dependency order and enter `Running`.
    ///
    /// If a start callback or hook fails, the components that already started are stopped in
    /// reverse order, `OnAbort` hooks run, exit code 10 is requested and the original error
    /// (or panic) is handed back to the caller.
    pub async fn start(&self) -> Result<()> {
        if let Some(phase) = callback_phase() {
            return Err(LifeError::Reentrant {
                operation: "start",
                phase,
            });
        }

        let mut core = self.inner.core.lock().await;
        if core.phase() != Phase::Initing {
            return Err(LifeError::InvalidStartPhase {
                phase: core.phase(),
            });
        }

        if let Err(fault) = self.start_components(&mut core).await {
            error!("Start failed: {}", fault.describe());

            let started = core.started_components();
            if let Some(last) = started.last() {
                info!(
                    "Error in starting package {}, shutdown all started packages",
                    last.name()
                );
                self.rollback(&started).await;
            }

            self.run_abort_hooks().await;
            self.inner.terminator.exit(EXIT_START_FAILED);
            return fault.raise();
        }
        drop(core);

        if self.inner.config.watches_signals() {
            match OsSignals::new() {
                Ok(signals) => {
                    self.monitor_signals(signals);
                }
                Err(e) => warn!("Failed to install signal handlers: {}", e),
            }
        }

        Ok(())
    }

    async fn start_components(&self, core: &mut Core) -> std::result::Result<(), Fault> {
        self.run_hooks(HookEvent::BeforeStarting, Phase::Initing)
            .await?;
        core.transition(&self.inner.mirror, Phase::Starting);

        let order = sort_by_dependency(&self.inner.components.snapshot())?;
        core.order = Some(order.clone());

        for (i, component) in order.iter().enumerate() {
            info!("Starting package {}", component.name());
            if let Some(on_start) = component.start_callback() {
                let name = component.name().to_string();
                invoke(&on_start, Phase::Starting, move |source| {
                    LifeError::ComponentStart {
                        component: name,
                        source,
                    }
                })
                .await?;
            }
            core.started = i + 1;
        }

        self.run_hooks(HookEvent::BeforeRunning, Phase::Starting)
            .await?;
        info!("all packages started, ready to serve");
        core.transition(&self.inner.mirror, Phase::Running);
        Ok(())
    }

    /// Stop components that started before a start failure, newest first.
    ///
    /// Failures here are logged so that they never hide the error that caused the rollback.
    async fn rollback(&self, started: &[Arc<Component>]) {
        for component in started.iter().rev() {
            info!("Shutdown package {}", component.name());
            if let Some(on_shutdown) = component.shutdown_callback() {
                let name = component.name().to_string();
                let result = invoke(&on_shutdown, Phase::Starting, move |source| {
                    LifeError::ComponentShutdown {
                        component: name,
                        source,
                    }
                })
                .await;
                if let Err(fault) = result {
                    error!(
                        "Error shutting down package {} during rollback: {}",
                        component.name(),
                        fault.describe()
                    );
                }
            }
        }
    }
}
