use crate::app::{HookEvent, Phase};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can not register {kind} \"{name}\" in \"{phase}\" phase")]
    WrongPhase {
        kind: &'static str,
        name: String,
        phase: Phase,
    },

    #[error("package '{name}' already registered")]
    DuplicateName { name: String },

    #[error("package name must not be empty")]
    EmptyName,

    #[error("Can not start in \"{phase}\" phase")]
    InvalidStartPhase { phase: Phase },

    #[error("{message} (expected \"{expected}\", current \"{actual}\")")]
    UnexpectedPhase {
        expected: Phase,
        actual: Phase,
        message: String,
    },

    #[error("Loop dependency detected{edges}")]
    DependencyCycle { edges: String },

    #[error("{operation} called from inside a lifecycle callback in \"{phase}\" phase")]
    Reentrant {
        operation: &'static str,
        phase: Phase,
    },

    #[error("Error in starting package {component}: {source}")]
    ComponentStart {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error in shutting down package {component}: {source}")]
    ComponentShutdown {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{event} hook {hook} failed: {source}")]
    Hook {
        hook: String,
        event: HookEvent,
        #[source]
        source: anyhow::Error,
    },
}

impl LifeError {
    pub fn wrong_phase<S: Into<String>>(kind: &'static str, name: S, phase: Phase) -> Self {
        Self::WrongPhase {
            kind,
            name: name.into(),
            phase,
        }
    }

    /// Whether the error came out of user callback code rather than from misuse of the API
    pub fn is_callback_failure(&self) -> bool {
        matches!(
            self,
            Self::ComponentStart { .. } | Self::ComponentShutdown { .. } | Self::Hook { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LifeError>;
