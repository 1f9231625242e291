//! In-process application lifecycle orchestration.
//!
//! Components register start/stop callbacks and the names of the components they depend on.
//! [`Lifecycle::start`] runs them in dependency order, [`Lifecycle::shutdown`] in reverse, and
//! hooks fire at the transitions in between. A failing callback runs the abort sequence:
//! started components are rolled back, `OnAbort` hooks run, process termination is requested
//! and the original error is returned.

pub mod app;
pub mod config;
pub mod error;

pub use app::{Component, HookEvent, Lifecycle, Phase, SignalSource, Terminator};
pub use config::LifeConfig;
pub use error::{LifeError, Result};
