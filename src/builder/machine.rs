//! Builder for constructing transition systems.

use crate::builder::error::BuildError;
use crate::core::{State, SystemAction};
use crate::system::{Transition, TransitionSystem};

/// Something that can be turned into a transition.
///
/// Implemented by both transition builders and by finished transitions, so
/// [`TransitionSystemBuilder::transition`] accepts either.
pub trait IntoTransition<S> {
    fn into_transition(self) -> Result<Transition<S>, BuildError>;
}

impl<S> IntoTransition<S> for Transition<S> {
    fn into_transition(self) -> Result<Transition<S>, BuildError> {
        Ok(self)
    }
}

impl<S: SystemAction> IntoTransition<S> for super::ReactiveBuilder<S> {
    fn into_transition(self) -> Result<Transition<S>, BuildError> {
        self.build()
    }
}

impl<S: SystemAction> IntoTransition<S> for super::ProactiveBuilder<S> {
    fn into_transition(self) -> Result<Transition<S>, BuildError> {
        self.build()
    }
}

/// Builder for transition systems with a fluent API.
///
/// States are collected in declaration order; transition endpoints are
/// checked against them when [`build`](Self::build) hands everything to
/// [`TransitionSystem::new`].
///
/// # Example
///
/// ```rust
/// use refinery::builder::{ProactiveBuilder, ReactiveBuilder, TransitionSystemBuilder};
/// use refinery::core::{ModelAction, SystemAction, Value};
///
/// #[derive(Debug)]
/// struct Nothing;
///
/// impl SystemAction for Nothing {
///     fn tag(&self) -> &str {
///         "Nothing"
///     }
/// }
///
/// let system = TransitionSystemBuilder::<Nothing>::new("echo")
///     .states(["S1", "S2"])
///     .initial("S1")
///     .transition(ReactiveBuilder::new("T1").on_model("Ping").from("S1").to("S2"))
///     .unwrap()
///     .transition(
///         ProactiveBuilder::new("T2")
///             .from("S2")
///             .to("S1")
///             .generate_model("Pong", |_| Ok(ModelAction::new("Pong", vec![Value::Int(1)]))),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(system.name(), "echo");
/// assert!(system.is_idle());
/// ```
pub struct TransitionSystemBuilder<S> {
    name: String,
    states: Vec<State>,
    initial: Option<State>,
    transitions: Vec<Transition<S>>,
}

impl<S: SystemAction> TransitionSystemBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            initial: None,
            transitions: Vec::new(),
        }
    }

    /// Declare one state.
    pub fn state(mut self, state: impl Into<State>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Declare several states.
    pub fn states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<State>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<State>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Add a transition from a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, transition: impl IntoTransition<S>) -> Result<Self, BuildError> {
        self.transitions.push(transition.into_transition()?);
        Ok(self)
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: impl Into<Transition<S>>) -> Self {
        self.transitions.push(transition.into());
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: Vec<Transition<S>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Build the transition system.
    /// Returns an error if required fields are missing or the structure is
    /// inconsistent.
    pub fn build(self) -> Result<TransitionSystem<S>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        TransitionSystem::new(self.name, self.states, initial, self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ProactiveBuilder, ReactiveBuilder, Violation};
    use crate::core::{Action, ModelAction, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct Spawn;

    impl SystemAction for Spawn {
        fn tag(&self) -> &str {
            "Spawn"
        }
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionSystemBuilder::<Spawn>::new("items")
            .states(["S1"])
            .build();

        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_rejects_empty_name() {
        let result = TransitionSystemBuilder::<Spawn>::new("")
            .state("S1")
            .initial("S1")
            .build();

        assert!(matches!(result, Err(BuildError::EmptyName)));
    }

    #[test]
    fn transition_errors_surface_immediately() {
        let result = TransitionSystemBuilder::<Spawn>::new("items")
            .state("S1")
            .transition(ReactiveBuilder::new("T1").from("S1").to("S1"));

        assert!(matches!(result, Err(BuildError::MissingActionTag(name)) if name == "T1"));
    }

    #[test]
    fn fluent_api_builds_system() {
        let system = TransitionSystemBuilder::<Spawn>::new("items")
            .states(["S1", "S2"])
            .initial("S1")
            .transition(
                ReactiveBuilder::new("T1")
                    .on_model("NewItem")
                    .from("S1")
                    .to("S2"),
            )
            .unwrap()
            .transition(
                ProactiveBuilder::new("T2")
                    .emits_system("Spawn")
                    .from("S2")
                    .to("S1")
                    .generate(|_| Ok(Action::System(Spawn))),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(system.states().len(), 2);
        assert_eq!(system.transitions().len(), 2);
        assert_eq!(system.current_state(), &State::new("S1"));
    }

    #[test]
    fn prebuilt_transitions_are_accepted() {
        let t1 = ReactiveBuilder::<Spawn>::new("T1")
            .on_system("Spawn")
            .from("S1")
            .to("S2")
            .build()
            .unwrap();
        let t2 = ProactiveBuilder::<Spawn>::new("T2")
            .from("S2")
            .to("S1")
            .generate_model("Done", |_| Ok(ModelAction::new("Done", vec![Value::Bool(true)])))
            .build()
            .unwrap();

        let system = TransitionSystemBuilder::<Spawn>::new("items")
            .states(["S1", "S2"])
            .initial("S1")
            .add_transition(t1)
            .transitions(vec![t2])
            .build()
            .unwrap();

        assert_eq!(system.transition_id("T2").map(|id| id.index()), Some(1));
    }

    #[test]
    fn build_reports_every_structural_violation() {
        let result = TransitionSystemBuilder::<Spawn>::new("items")
            .states(["S1", "S2"])
            .initial("S1")
            .transition(ReactiveBuilder::new("T1").on_model("A").from("S1").to("S3"))
            .unwrap()
            .transition(ReactiveBuilder::new("T1").on_model("B").from("S4").to("S2"))
            .unwrap()
            .build();

        let Err(BuildError::Malformed { violations, .. }) = result else {
            panic!("Expected malformed system");
        };
        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&Violation::DuplicateTransition("T1".to_string())));
        assert!(violations.contains(&Violation::UnknownTarget {
            transition: "T1".to_string(),
            state: State::new("S3"),
        }));
        assert!(violations.contains(&Violation::UnknownSource {
            transition: "T1".to_string(),
            state: State::new("S4"),
        }));
    }
}
