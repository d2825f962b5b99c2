//! Transition systems: single refinement automata and their transitions.

mod error;
mod machine;
mod transition;

pub use error::EngineError;
pub use machine::{SystemId, TransitionSystem};
pub use transition::{
    generate, no_update, update, Generator, ProactiveTransition, ReactiveTransition, Transition,
    TransitionId, Update,
};
