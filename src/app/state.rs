use super::component::Component;
use super::types::Phase;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

/// Lock-free copy of the current phase.
///
/// The authoritative phase lives in [`Core`] behind the lifecycle lock. Callbacks run while
/// that lock is held, so anything they read has to come from here instead.
#[derive(Debug)]
pub(super) struct PhaseMirror {
    value: AtomicU8,
}

impl PhaseMirror {
    pub(super) fn new() -> Self {
        Self {
            value: AtomicU8::new(Phase::Initing as u8),
        }
    }

    pub(super) fn load(&self) -> Phase {
        Phase::from_u8(self.value.load(Ordering::Acquire))
    }

    fn publish(&self, phase: Phase) {
        self.value.store(phase as u8, Ordering::Release);
    }
}

/// State guarded by the lifecycle lock
pub(super) struct Core {
    phase: Phase,
    /// Start order computed by the first `start`, reversed for shutdown
    pub(super) order: Option<Vec<Arc<Component>>>,
    /// How many entries of `order` have started successfully
    pub(super) started: usize,
}

impl Core {
    pub(super) fn new() -> Self {
        Self {
            phase: Phase::Initing,
            order: None,
            started: 0,
        }
    }

    pub(super) fn phase(&self) -> Phase {
        self.phase
    }

    /// Record `next` and publish it to the mirror.
    ///
    /// Legality of the transition is checked by the caller.
    pub(super) fn transition(&mut self, mirror: &PhaseMirror, next: Phase) {
        info!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        mirror.publish(next);
    }

    /// Components that completed their start callback, in start order
    pub(super) fn started_components(&self) -> Vec<Arc<Component>> {
        self.order
            .as_ref()
            .map(|order| order[..self.started].to_vec())
            .unwrap_or_default()
    }
}
