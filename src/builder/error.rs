//! Build errors for transition system and transition builders.

use crate::core::State;
use thiserror::Error;

/// Errors that can occur when building transition systems and transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("Transition system name is empty. Call .name(name) with a non-empty name")]
    EmptyName,

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition name is empty")]
    EmptyTransitionName,

    #[error("Transition '{0}': source state not specified. Call .from(state)")]
    MissingFromState(String),

    #[error("Transition '{0}': target state not specified. Call .to(state)")]
    MissingToState(String),

    #[error("Transition '{0}': action tag not specified. Call .on_model(name) or .on_system(tag)")]
    MissingActionTag(String),

    #[error("Transition '{0}': generator not specified. Call .generate(f)")]
    MissingGenerator(String),

    #[error("Transition system '{system}' is malformed: {}", join(.violations))]
    Malformed {
        system: String,
        violations: Vec<Violation>,
    },
}

/// A structural problem in a transition system definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("state with empty name")]
    EmptyStateName,

    #[error("duplicate state '{0}'")]
    DuplicateState(State),

    #[error("initial state '{0}' is not a declared state")]
    UnknownInitialState(State),

    #[error("duplicate transition name '{0}'")]
    DuplicateTransition(String),

    #[error("transition '{transition}' leaves undeclared state '{state}'")]
    UnknownSource { transition: String, state: State },

    #[error("transition '{transition}' enters undeclared state '{state}'")]
    UnknownTarget { transition: String, state: State },
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
