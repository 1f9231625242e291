mod component;
mod exit;
mod fault;
mod hooks;
mod orchestrator;
mod resolver;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use component::Component;
pub use exit::{ProcessTerminator, Terminator};
pub use orchestrator::Lifecycle;
pub use resolver::sort_by_dependency;
pub use runtime::{OsSignals, SignalSource};
pub use types::{
    callback, Callback, HookEvent, Phase, EXIT_ABORT, EXIT_SHUTDOWN_FAILED, EXIT_SIGNAL_FORCED,
    EXIT_START_FAILED,
};
