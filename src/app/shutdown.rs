use super::fault::{callback_phase, invoke, Fault};
use super::state::Core;
use super::types::{HookEvent, Phase, EXIT_ABORT, EXIT_SHUTDOWN_FAILED};
use super::Lifecycle;
use crate::error::{LifeError, Result};
use tracing::{error, info};

impl Lifecycle {
    /// Stop started components in reverse start order and enter `Halt`.
    ///
    /// Safe to call any number of times from any number of tasks: callers that arrive while a
    /// shutdown is in flight return once it finishes. Before `Running` there is nothing to stop
    /// and the phase moves straight to `Halt`.
    ///
    /// A failing stop callback or hook still leaves the lifecycle in `Halt`, then `OnAbort`
    /// hooks run, exit code 11 is requested and the original error (or panic) is handed back.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(phase) = callback_phase() {
            return Err(LifeError::Reentrant {
                operation: "shutdown",
                phase,
            });
        }

        let mut core = self.inner.core.lock().await;
        match core.phase() {
            Phase::Running => {}
            Phase::Halt => return Ok(()),
            Phase::Shutingdown => {
                return Err(LifeError::Reentrant {
                    operation: "shutdown",
                    phase: Phase::Shutingdown,
                })
            }
            Phase::Initing | Phase::Starting => {
                info!("Shutdown requested in {} phase, nothing to stop", core.phase());
                self.halt(&mut core);
                return Ok(());
            }
        }

        core.transition(&self.inner.mirror, Phase::Shutingdown);
        let result = self.stop_components(&core).await;
        self.halt(&mut core);
        drop(core);

        if let Err(fault) = result {
            error!("Shutdown failed: {}", fault.describe());
            self.run_abort_hooks().await;
            self.inner.terminator.exit(EXIT_SHUTDOWN_FAILED);
            return fault.raise();
        }

        info!("all packages shutdown, ready to exit");
        Ok(())
    }

    async fn stop_components(&self, core: &Core) -> std::result::Result<(), Fault> {
        self.run_hooks(HookEvent::BeforeShutingdown, Phase::Shutingdown)
            .await?;

        for component in core.started_components().iter().rev() {
            info!("Shutdown package {}", component.name());
            if let Some(on_shutdown) = component.shutdown_callback() {
                let name = component.name().to_string();
                invoke(&on_shutdown, Phase::Shutingdown, move |source| {
                    LifeError::ComponentShutdown {
                        component: name,
                        source,
                    }
                })
                .await?;
            }
        }
        Ok(())
    }

    fn halt(&self, core: &mut Core) {
        core.transition(&self.inner.mirror, Phase::Halt);
        self.inner.halted.cancel();
    }

    /// Block until shutdown has completed. Returns at once if it already has.
    pub async fn wait_to_end(&self) {
        if self.phase() == Phase::Halt {
            return;
        }
        self.inner.halted.cancelled().await;
    }

    /// Run `OnAbort` hooks and request termination with exit code 12.
    ///
    /// Abort hooks always run here, even after a clean shutdown.
    pub async fn abort(&self) {
        error!("Abort requested in {} phase", self.phase());
        self.run_abort_hooks().await;
        self.inner.terminator.exit(EXIT_ABORT);
    }

    /// Request termination with `code`, running `OnAbort` hooks first unless the lifecycle
    /// already reached `Halt`.
    pub async fn exit(&self, code: i32) {
        if self.phase() != Phase::Halt {
            self.run_abort_hooks().await;
        }
        info!("Exit with code {}", code);
        self.inner.terminator.exit(code);
    }
}
