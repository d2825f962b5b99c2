//! Core value types of the refinement engine.
//!
//! This module contains the leaves everything else is built from:
//! - Named states
//! - Primitive values and the typed variable store
//! - Model and system actions, their tags, and the wire format
//! - Guard predicates
//! - Firing history

mod action;
mod guard;
mod history;
mod state;
mod value;
mod variables;

pub use action::{
    Action, ActionError, ActionTag, ActionType, Catalog, ModelAction, Signature, SystemAction,
};
pub use guard::Guard;
pub use history::{Firing, FiringHistory, TransitionKind};
pub use state::State;
pub use value::{Kind, Primitive, Value};
pub use variables::{StoreError, VariableStore};
