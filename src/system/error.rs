//! Errors raised while stepping transition systems and the framework.

use crate::core::{ActionError, ActionTag, State, StoreError};
use crate::snapshot::Snapshot;
use crate::system::SystemId;
use thiserror::Error;

/// Failures of the refinement engine.
///
/// Apart from collaborator send failures, every variant is a contract
/// violation or a deadlock: the automaton definition or the caller is wrong
/// and the test run should stop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transition {transition} of system '{system}' is not possible from state '{state}'")]
    IllegalTransition {
        system: String,
        transition: String,
        state: State,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Transition '{transition}' declares {declared} but generated {generated}")]
    GeneratedTagMismatch {
        transition: String,
        declared: ActionTag,
        generated: ActionTag,
    },

    #[error("No registered system with id {0}")]
    UnknownSystem(SystemId),

    #[error("System '{system}' references model action '{action}' missing from the catalog")]
    UnknownAction { system: String, action: String },

    #[error("System '{system}' is in state '{state}', not its initial state, and cannot be added")]
    SystemNotIdle { system: String, state: State },

    #[error("No catalog registered; cannot decode input '{0}'")]
    NoCatalog(String),

    #[error("Deadlock: queued work cannot be consumed by any enabled transition\n{0}")]
    Deadlock(Box<Snapshot>),

    #[error("Step limit of {limit} transitions reached with transitions still enabled\n{snapshot}")]
    StepLimitExceeded {
        limit: usize,
        snapshot: Box<Snapshot>,
    },

    #[error("Model output receiver closed, dropped '{0}'")]
    OutputClosed(String),

    #[error("System command receiver closed, dropped {0}")]
    CommandClosed(String),
}

impl EngineError {
    /// The framework diagnostic attached to deadlock and step limit failures.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            EngineError::Deadlock(snapshot) => Some(snapshot),
            EngineError::StepLimitExceeded { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}
