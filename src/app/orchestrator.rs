use super::component::{Component, ComponentRegistry};
use super::exit::{ProcessTerminator, Terminator};
use super::fault::Fault;
use super::hooks::HookRegistry;
use super::resolver::sort_by_dependency;
use super::state::{Core, PhaseMirror};
use super::types::{callback, HookEvent, Phase};
use crate::config::LifeConfig;
use crate::error::{LifeError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Coordinates ordered startup and shutdown of registered components.
///
/// Cloning is cheap and every clone drives the same lifecycle.
#[derive(Clone)]
pub struct Lifecycle {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub(super) config: LifeConfig,
    pub(super) mirror: PhaseMirror,
    /// Held for the whole of `start` and `shutdown`
    pub(super) core: Mutex<Core>,
    pub(super) components: ComponentRegistry,
    pub(super) hooks: HookRegistry,
    /// Cancelled on entering `Halt`
    pub(super) halted: CancellationToken,
    pub(super) terminator: Arc<dyn Terminator>,
}

impl Lifecycle {
    /// Create a lifecycle that terminates the real process on abort
    pub fn new(config: LifeConfig) -> Self {
        Self::with_terminator(config, Arc::new(ProcessTerminator))
    }

    /// Create a lifecycle with a custom termination facility
    pub fn with_terminator(config: LifeConfig, terminator: Arc<dyn Terminator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                mirror: PhaseMirror::new(),
                core: Mutex::new(Core::new()),
                components: ComponentRegistry::default(),
                hooks: HookRegistry::default(),
                halted: CancellationToken::new(),
                terminator,
            }),
        }
    }

    pub fn config(&self) -> &LifeConfig {
        &self.inner.config
    }

    /// Current phase. Lock-free, safe to call from inside callbacks.
    pub fn phase(&self) -> Phase {
        self.inner.mirror.load()
    }

    /// Fail with `message` unless the current phase is `expected`
    pub fn ensure_phase<S: Into<String>>(&self, expected: Phase, message: S) -> Result<()> {
        let actual = self.phase();
        if actual != expected {
            return Err(LifeError::UnexpectedPhase {
                expected,
                actual,
                message: message.into(),
            });
        }
        Ok(())
    }

    /// Register a component. Only allowed while `Initing`.
    pub fn register(&self, component: Component) -> Result<()> {
        let phase = self.phase();
        if phase != Phase::Initing {
            return Err(LifeError::wrong_phase("package", component.name(), phase));
        }

        debug!(
            "Register package {} depends on {:?}",
            component.name(),
            component.depends()
        );
        self.inner.components.insert(component)
    }

    /// Register a hook for `event`. Only allowed while `Initing`.
    ///
    /// Hooks of one event run by ascending `order`; equal orders run in any order. `name` is
    /// used in logs only.
    pub fn register_hook<S, F, Fut>(
        &self,
        name: S,
        order: i32,
        event: HookEvent,
        f: F,
    ) -> Result<()>
    where
        S: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let phase = self.phase();
        if phase != Phase::Initing {
            return Err(LifeError::wrong_phase("hook", name, phase));
        }

        debug!("Register {} hook {} with order {}", event, name, order);
        self.inner.hooks.insert(name, order, event, callback(f));
        Ok(())
    }

    pub fn component_count(&self) -> usize {
        self.inner.components.len()
    }

    pub fn hook_count(&self, event: HookEvent) -> usize {
        self.inner.hooks.count(event)
    }

    /// Names of the registered components in the order `start` would use
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        let order = sort_by_dependency(&self.inner.components.snapshot())?;
        Ok(order.iter().map(|c| c.name().to_string()).collect())
    }

    pub(super) async fn run_hooks(
        &self,
        event: HookEvent,
        phase: Phase,
    ) -> std::result::Result<(), Fault> {
        self.inner
            .hooks
            .run(event, phase, self.inner.config.hook_timeout())
            .await
    }

    pub(super) async fn run_abort_hooks(&self) {
        self.inner
            .hooks
            .run_abort(self.phase(), self.inner.config.hook_timeout())
            .await
    }
}
