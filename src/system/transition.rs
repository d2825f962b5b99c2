//! Reactive and proactive transitions.

use crate::core::{
    Action, ActionTag, Guard, State, StoreError, SystemAction, TransitionKind, VariableStore,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Procedure applied to the variables when a transition fires.
pub type Update<S> =
    Arc<dyn Fn(&Action<S>, &mut VariableStore) -> Result<(), StoreError> + Send + Sync>;

/// Produces the action a proactive transition emits.
pub type Generator<S> =
    Arc<dyn Fn(&VariableStore) -> Result<Action<S>, StoreError> + Send + Sync>;

/// Wrap an update procedure.
pub fn update<S, F>(procedure: F) -> Update<S>
where
    F: Fn(&Action<S>, &mut VariableStore) -> Result<(), StoreError> + Send + Sync + 'static,
{
    Arc::new(procedure)
}

/// Update procedure that leaves the variables alone.
pub fn no_update<S: 'static>() -> Update<S> {
    update(|_, _| Ok(()))
}

/// Wrap a generator.
pub fn generate<S, F>(generator: F) -> Generator<S>
where
    F: Fn(&VariableStore) -> Result<Action<S>, StoreError> + Send + Sync + 'static,
{
    Arc::new(generator)
}

/// Handle to a transition within its owning system.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fires in response to a consumed action.
pub struct ReactiveTransition<S> {
    pub name: String,
    pub tag: ActionTag,
    pub from: State,
    pub to: State,
    pub guard: Guard<S>,
    pub update: Update<S>,
}

impl<S: SystemAction> ReactiveTransition<S> {
    /// Check whether this transition may consume `action` from `current` (pure).
    pub fn accepts(&self, current: &State, action: &Action<S>, vars: &VariableStore) -> bool {
        if *current != self.from {
            return false;
        }
        if !action.matches(&self.tag) {
            return false;
        }
        self.guard.check(action, vars)
    }
}

/// Fires on its own, producing an action.
pub struct ProactiveTransition<S> {
    pub name: String,
    pub tag: ActionTag,
    pub from: State,
    pub to: State,
    pub generate: Generator<S>,
    pub update: Update<S>,
}

impl<S> ProactiveTransition<S> {
    /// Proactive transitions have no guard: leaving `current` is enough.
    pub fn is_enabled(&self, current: &State) -> bool {
        *current == self.from
    }
}

/// A transition of either shape.
pub enum Transition<S> {
    Reactive(ReactiveTransition<S>),
    Proactive(ProactiveTransition<S>),
}

impl<S> Transition<S> {
    pub fn name(&self) -> &str {
        match self {
            Transition::Reactive(t) => &t.name,
            Transition::Proactive(t) => &t.name,
        }
    }

    pub fn from(&self) -> &State {
        match self {
            Transition::Reactive(t) => &t.from,
            Transition::Proactive(t) => &t.from,
        }
    }

    pub fn to(&self) -> &State {
        match self {
            Transition::Reactive(t) => &t.to,
            Transition::Proactive(t) => &t.to,
        }
    }

    pub fn tag(&self) -> &ActionTag {
        match self {
            Transition::Reactive(t) => &t.tag,
            Transition::Proactive(t) => &t.tag,
        }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Reactive(_) => TransitionKind::Reactive,
            Transition::Proactive(_) => TransitionKind::Proactive,
        }
    }

    pub fn as_reactive(&self) -> Option<&ReactiveTransition<S>> {
        match self {
            Transition::Reactive(t) => Some(t),
            Transition::Proactive(_) => None,
        }
    }

    pub fn as_proactive(&self) -> Option<&ProactiveTransition<S>> {
        match self {
            Transition::Reactive(_) => None,
            Transition::Proactive(t) => Some(t),
        }
    }
}

impl<S> fmt::Display for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) {} -> {}",
            self.kind(),
            self.name(),
            self.tag(),
            self.from(),
            self.to()
        )
    }
}

impl<S> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<S> From<ReactiveTransition<S>> for Transition<S> {
    fn from(transition: ReactiveTransition<S>) -> Self {
        Transition::Reactive(transition)
    }
}

impl<S> From<ProactiveTransition<S>> for Transition<S> {
    fn from(transition: ProactiveTransition<S>) -> Self {
        Transition::Proactive(transition)
    }
}
