use super::types::{Callback, Phase};
use crate::error::{LifeError, Result};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

tokio::task_local! {
    /// Set while a component or hook callback is running
    static CALLBACK_PHASE: Phase;
}

/// Phase the current task's lifecycle callback was invoked in, if any
pub(super) fn callback_phase() -> Option<Phase> {
    CALLBACK_PHASE.try_with(|phase| *phase).ok()
}

/// Failure raised by a callback: an error it returned, or a panic it unwound with
pub(super) enum Fault {
    Failed(LifeError),
    Panicked(Box<dyn Any + Send>),
}

impl Fault {
    /// Hand the original failure back to the caller
    pub(super) fn raise<T>(self) -> Result<T> {
        match self {
            Fault::Failed(err) => Err(err),
            Fault::Panicked(payload) => panic::resume_unwind(payload),
        }
    }

    pub(super) fn describe(&self) -> String {
        match self {
            Fault::Failed(err) => err.to_string(),
            Fault::Panicked(payload) => panic_message(payload.as_ref()),
        }
    }
}

impl From<LifeError> for Fault {
    fn from(err: LifeError) -> Self {
        Fault::Failed(err)
    }
}

/// Run `callback` inside the callback scope, catching its panic
pub(super) async fn invoke<E>(
    callback: &Callback,
    phase: Phase,
    wrap: E,
) -> std::result::Result<(), Fault>
where
    E: FnOnce(anyhow::Error) -> LifeError,
{
    let fut = CALLBACK_PHASE.scope(phase, async move { callback().await });
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(Fault::Failed(wrap(source))),
        Err(payload) => Err(Fault::Panicked(payload)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with non-string payload".to_string()
    }
}
