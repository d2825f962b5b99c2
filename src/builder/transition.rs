//! Builders for reactive and proactive transitions.

use crate::builder::error::BuildError;
use crate::core::{
    Action, ActionTag, Guard, ModelAction, State, StoreError, SystemAction, VariableStore,
};
use crate::system::{
    generate, no_update, update, Generator, ProactiveTransition, ReactiveTransition, Transition,
    Update,
};

/// Builder for transitions that consume an action.
///
/// The guard defaults to accepting every action with the declared tag, the
/// update to leaving the variables alone.
///
/// # Example
///
/// ```rust
/// use refinery::builder::ReactiveBuilder;
/// use refinery::core::{State, SystemAction};
///
/// #[derive(Debug)]
/// struct Beep;
///
/// impl SystemAction for Beep {
///     fn tag(&self) -> &str {
///         "Beep"
///     }
/// }
///
/// let transition = ReactiveBuilder::<Beep>::new("T1")
///     .on_model("NewItem")
///     .from("S1")
///     .to("S2")
///     .when_model(|action, _| action.field::<i32>(0) == Some(1))
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.from(), &State::new("S1"));
/// ```
pub struct ReactiveBuilder<S> {
    name: String,
    tag: Option<ActionTag>,
    from: Option<State>,
    to: Option<State>,
    guard: Option<Guard<S>>,
    update: Option<Update<S>>,
}

impl<S: SystemAction> ReactiveBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            from: None,
            to: None,
            guard: None,
            update: None,
        }
    }

    /// Consume model actions named `name` (required, or [`on_system`](Self::on_system)).
    pub fn on_model(mut self, name: impl Into<String>) -> Self {
        self.tag = Some(ActionTag::model(name));
        self
    }

    /// Consume system actions tagged `tag`.
    pub fn on_system(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(ActionTag::system(tag));
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: impl Into<State>) -> Self {
        self.from = Some(state.into());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<State>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Use a prepared guard.
    pub fn guard(mut self, guard: Guard<S>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard over any action.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Action<S>, &VariableStore) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Add a guard over model actions.
    pub fn when_model<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ModelAction, &VariableStore) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::model(predicate));
        self
    }

    /// Add a guard over system actions.
    pub fn when_system<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S, &VariableStore) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::system(predicate));
        self
    }

    /// Set the update procedure run with the consumed action.
    pub fn update<F>(mut self, procedure: F) -> Self
    where
        F: Fn(&Action<S>, &mut VariableStore) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        self.update = Some(update(procedure));
        self
    }

    pub fn build(self) -> Result<Transition<S>, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::EmptyTransitionName);
        }
        let tag = self
            .tag
            .ok_or_else(|| BuildError::MissingActionTag(self.name.clone()))?;
        let from = self
            .from
            .ok_or_else(|| BuildError::MissingFromState(self.name.clone()))?;
        let to = self
            .to
            .ok_or_else(|| BuildError::MissingToState(self.name.clone()))?;

        Ok(Transition::Reactive(ReactiveTransition {
            name: self.name,
            tag,
            from,
            to,
            guard: self.guard.unwrap_or_else(Guard::always),
            update: self.update.unwrap_or_else(no_update),
        }))
    }
}

/// Builder for transitions that produce an action.
///
/// The declared tag is implied by [`generate_model`](Self::generate_model)
/// or set with [`emits_model`](Self::emits_model) /
/// [`emits_system`](Self::emits_system) when using [`generate`](Self::generate).
pub struct ProactiveBuilder<S> {
    name: String,
    tag: Option<ActionTag>,
    from: Option<State>,
    to: Option<State>,
    generate: Option<Generator<S>>,
    update: Option<Update<S>>,
}

impl<S: SystemAction> ProactiveBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            from: None,
            to: None,
            generate: None,
            update: None,
        }
    }

    /// Declare that this transition produces model actions named `name`.
    pub fn emits_model(mut self, name: impl Into<String>) -> Self {
        self.tag = Some(ActionTag::model(name));
        self
    }

    /// Declare that this transition produces system actions tagged `tag`.
    pub fn emits_system(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(ActionTag::system(tag));
        self
    }

    pub fn from(mut self, state: impl Into<State>) -> Self {
        self.from = Some(state.into());
        self
    }

    pub fn to(mut self, state: impl Into<State>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Set the generator (required).
    pub fn generate<F>(mut self, generator: F) -> Self
    where
        F: Fn(&VariableStore) -> Result<Action<S>, StoreError> + Send + Sync + 'static,
    {
        self.generate = Some(generate(generator));
        self
    }

    /// Generate model actions named `name`, declaring the tag in one step.
    pub fn generate_model<F>(self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&VariableStore) -> Result<ModelAction, StoreError> + Send + Sync + 'static,
    {
        self.emits_model(name)
            .generate(move |vars| generator(vars).map(Action::Model))
    }

    /// Set the update procedure run with the generated action.
    pub fn update<F>(mut self, procedure: F) -> Self
    where
        F: Fn(&Action<S>, &mut VariableStore) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        self.update = Some(update(procedure));
        self
    }

    pub fn build(self) -> Result<Transition<S>, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::EmptyTransitionName);
        }
        let tag = self
            .tag
            .ok_or_else(|| BuildError::MissingActionTag(self.name.clone()))?;
        let from = self
            .from
            .ok_or_else(|| BuildError::MissingFromState(self.name.clone()))?;
        let to = self
            .to
            .ok_or_else(|| BuildError::MissingToState(self.name.clone()))?;
        let generate = self
            .generate
            .ok_or_else(|| BuildError::MissingGenerator(self.name.clone()))?;

        Ok(Transition::Proactive(ProactiveTransition {
            name: self.name,
            tag,
            from,
            to,
            generate,
            update: self.update.unwrap_or_else(no_update),
        }))
    }
}
