//! Guard predicates for reactive transitions.
//!
//! Guards decide whether an incoming action may be consumed. They see the
//! owning system's variables through a shared reference only, so evaluating
//! a guard can never modify the store.

use super::action::{Action, ModelAction, SystemAction};
use super::variables::VariableStore;
use std::sync::Arc;

type Predicate<S> = dyn Fn(&Action<S>, &VariableStore) -> bool + Send + Sync;

/// Read-only predicate over an incoming action and the current variables.
///
/// # Example
///
/// ```rust
/// use refinery::core::{Action, Guard, ModelAction, SystemAction, Value, VariableStore};
///
/// #[derive(Debug)]
/// struct Ping;
///
/// impl SystemAction for Ping {
///     fn tag(&self) -> &str {
///         "Ping"
///     }
/// }
///
/// let only_first = Guard::<Ping>::model(|action, _vars| action.field::<i32>(0) == Some(1));
/// let vars = VariableStore::new();
///
/// let first = Action::Model(ModelAction::new("NewItem", vec![Value::Int(1)]));
/// let other = Action::Model(ModelAction::new("NewItem", vec![Value::Int(2)]));
///
/// assert!(only_first.check(&first, &vars));
/// assert!(!only_first.check(&other, &vars));
/// ```
pub struct Guard<S> {
    predicate: Arc<Predicate<S>>,
}

impl<S: SystemAction> Guard<S> {
    /// Guard over any action.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Action<S>, &VariableStore) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that accepts every action.
    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    /// Guard over model actions; rejects system actions.
    pub fn model<F>(predicate: F) -> Self
    where
        F: Fn(&ModelAction, &VariableStore) -> bool + Send + Sync + 'static,
    {
        Self::new(move |action, vars| match action {
            Action::Model(model) => predicate(model, vars),
            Action::System(_) => false,
        })
    }

    /// Guard over system actions; rejects model actions.
    pub fn system<F>(predicate: F) -> Self
    where
        F: Fn(&S, &VariableStore) -> bool + Send + Sync + 'static,
    {
        Self::new(move |action, vars| match action {
            Action::Model(_) => false,
            Action::System(system) => predicate(system, vars),
        })
    }

    /// Evaluate the guard.
    pub fn check(&self, action: &Action<S>, vars: &VariableStore) -> bool {
        (self.predicate)(action, vars)
    }
}

impl<S> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
