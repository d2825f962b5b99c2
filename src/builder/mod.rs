//! Builder API for ergonomic transition system construction.
//!
//! This module provides fluent builders for transitions and transition
//! systems, and the [`model_actions!`](crate::model_actions) macro for typed
//! model actions.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::{BuildError, Violation};
pub use machine::{IntoTransition, TransitionSystemBuilder};
pub use transition::{ProactiveBuilder, ReactiveBuilder};
