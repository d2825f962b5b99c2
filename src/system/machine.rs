//! A single refinement automaton.

use crate::builder::{BuildError, Violation};
use crate::core::{
    Action, Firing, FiringHistory, State, SystemAction, TransitionKind, VariableStore,
};
use crate::system::error::EngineError;
use crate::system::transition::{Transition, TransitionId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;
use uuid::Uuid;

/// Identity of a registered transition system.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SystemId(Uuid);

impl SystemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Finite automaton with typed variables, refining model actions into
/// system actions and back.
///
/// States and transitions are fixed at construction. Only the current state
/// and the variables change, and only inside
/// [`execute_reactive_transition`](Self::execute_reactive_transition) and
/// [`execute_proactive_transition`](Self::execute_proactive_transition).
pub struct TransitionSystem<S> {
    id: SystemId,
    name: String,
    states: Vec<State>,
    initial: State,
    current: State,
    transitions: Vec<Transition<S>>,
    variables: VariableStore,
    history: FiringHistory,
}

impl<S: SystemAction> TransitionSystem<S> {
    /// Create a system in its initial state.
    ///
    /// All structural problems are reported together in
    /// [`BuildError::Malformed`].
    pub fn new(
        name: impl Into<String>,
        states: Vec<State>,
        initial: State,
        transitions: Vec<Transition<S>>,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BuildError::EmptyName);
        }

        if let Validation::Failure(errors) = validate_structure(&states, &initial, &transitions) {
            return Err(BuildError::Malformed {
                system: name,
                violations: errors.iter().cloned().collect(),
            });
        }

        Ok(Self {
            id: SystemId::new(),
            name,
            states,
            current: initial.clone(),
            initial,
            transitions,
            variables: VariableStore::new(),
            history: FiringHistory::new(),
        })
    }

    /// Reactive transitions that may consume `action` right now.
    ///
    /// A transition qualifies when it leaves the current state, declares the
    /// action's tag, and its guard accepts the action. Guards only see the
    /// variables through a shared reference.
    pub fn possible_reactive_transitions(&self, action: &Action<S>) -> Vec<TransitionId> {
        self.transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.as_reactive()
                    .is_some_and(|r| r.accepts(&self.current, action, &self.variables))
            })
            .map(|(index, _)| TransitionId(index))
            .collect()
    }

    /// Proactive transitions leaving the current state.
    pub fn possible_proactive_transitions(&self) -> Vec<TransitionId> {
        self.transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.as_proactive().is_some_and(|p| p.is_enabled(&self.current)))
            .map(|(index, _)| TransitionId(index))
            .collect()
    }

    /// Consume `action` through `id`.
    ///
    /// Runs the update procedure, then moves to the transition's target. If
    /// the update fails, the error is returned and the current state is left
    /// unchanged; variables already written by the update stay written.
    pub fn execute_reactive_transition(
        &mut self,
        action: &Action<S>,
        id: TransitionId,
    ) -> Result<(), EngineError> {
        if !self.possible_reactive_transitions(action).contains(&id) {
            return Err(self.illegal(id));
        }
        let Some(Transition::Reactive(transition)) = self.transitions.get(id.0) else {
            return Err(self.illegal(id));
        };

        (transition.update)(action, &mut self.variables)?;

        debug!(
            system = %self.name,
            transition = %transition.name,
            from = %self.current,
            to = %transition.to,
            action = %action.describe(),
            "Reactive transition executed"
        );
        self.history.record(Firing {
            transition: transition.name.clone(),
            kind: TransitionKind::Reactive,
            from: self.current.clone(),
            to: transition.to.clone(),
            action: action.describe(),
            timestamp: Utc::now(),
        });
        self.current = transition.to.clone();
        Ok(())
    }

    /// Fire `id`, returning the action it generated.
    ///
    /// Generates the action from the variables, checks it against the
    /// transition's declared tag, runs the update procedure with it, and
    /// moves to the target state.
    pub fn execute_proactive_transition(
        &mut self,
        id: TransitionId,
    ) -> Result<Action<S>, EngineError> {
        if !self.possible_proactive_transitions().contains(&id) {
            return Err(self.illegal(id));
        }
        let Some(Transition::Proactive(transition)) = self.transitions.get(id.0) else {
            return Err(self.illegal(id));
        };

        let action = (transition.generate)(&self.variables)?;
        if !action.matches(&transition.tag) {
            return Err(EngineError::GeneratedTagMismatch {
                transition: transition.name.clone(),
                declared: transition.tag.clone(),
                generated: action.tag(),
            });
        }

        (transition.update)(&action, &mut self.variables)?;

        debug!(
            system = %self.name,
            transition = %transition.name,
            from = %self.current,
            to = %transition.to,
            action = %action.describe(),
            "Proactive transition executed"
        );
        self.history.record(Firing {
            transition: transition.name.clone(),
            kind: TransitionKind::Proactive,
            from: self.current.clone(),
            to: transition.to.clone(),
            action: action.describe(),
            timestamp: Utc::now(),
        });
        self.current = transition.to.clone();
        Ok(action)
    }

    fn illegal(&self, id: TransitionId) -> EngineError {
        let transition = self
            .transitions
            .get(id.0)
            .map(|t| format!("'{}'", t.name()))
            .unwrap_or_else(|| id.to_string());
        EngineError::IllegalTransition {
            system: self.name.clone(),
            transition,
            state: self.current.clone(),
        }
    }
}

impl<S> TransitionSystem<S> {
    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    pub fn current_state(&self) -> &State {
        &self.current
    }

    /// Whether the system is back in its initial state.
    pub fn is_idle(&self) -> bool {
        self.current == self.initial
    }

    pub fn transitions(&self) -> &[Transition<S>] {
        &self.transitions
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition<S>> {
        self.transitions.get(id.0)
    }

    /// Look a transition up by name.
    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter()
            .position(|t| t.name() == name)
            .map(TransitionId)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn history(&self) -> &FiringHistory {
        &self.history
    }
}

/// Accumulate every structural violation instead of stopping at the first.
fn validate_structure<S>(
    states: &[State],
    initial: &State,
    transitions: &[Transition<S>],
) -> Validation<(), NonEmptyVec<Violation>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<Violation>>> = Vec::new();

    let mut seen = HashSet::new();
    for state in states {
        if state.name().is_empty() {
            checks.push(Validation::fail(Violation::EmptyStateName));
        } else if !seen.insert(state) {
            checks.push(Validation::fail(Violation::DuplicateState(state.clone())));
        }
    }

    if !seen.contains(initial) {
        checks.push(Validation::fail(Violation::UnknownInitialState(
            initial.clone(),
        )));
    }

    let mut names = HashSet::new();
    for transition in transitions {
        if !names.insert(transition.name()) {
            checks.push(Validation::fail(Violation::DuplicateTransition(
                transition.name().to_string(),
            )));
        }
        if !seen.contains(transition.from()) {
            checks.push(Validation::fail(Violation::UnknownSource {
                transition: transition.name().to_string(),
                state: transition.from().clone(),
            }));
        }
        if !seen.contains(transition.to()) {
            checks.push(Validation::fail(Violation::UnknownTarget {
                transition: transition.name().to_string(),
                state: transition.to().clone(),
            }));
        }
    }

    if checks.is_empty() {
        return Validation::success(());
    }
    Validation::all_vec(checks).map(|_| ())
}

impl<S> fmt::Display for TransitionSystem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TransitionSystem ({}) [{}]", self.name, self.id)?;
        writeln!(f, "States:")?;
        for state in &self.states {
            writeln!(f, "\t{state}")?;
        }
        writeln!(f, "InitialState: {}", self.initial)?;
        writeln!(f, "CurrentState: {}", self.current)?;
        writeln!(f, "Transitions:")?;
        for transition in &self.transitions {
            writeln!(f, "\t{transition}")?;
        }
        write!(f, "Variables: {}", self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionTag, Guard, ModelAction, StoreError, Value};
    use crate::system::transition::{
        generate, no_update, update, ProactiveTransition, ReactiveTransition,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Sut {
        ItemNew { guid: u32 },
        Spawn { guid: u32 },
    }

    impl SystemAction for Sut {
        fn tag(&self) -> &str {
            match self {
                Self::ItemNew { .. } => "ItemNew",
                Self::Spawn { .. } => "Spawn",
            }
        }
    }

    const GUIDS: [u32; 2] = [0xc873, 0x10d0];

    fn wait() -> State {
        State::new("Wait")
    }

    fn act() -> State {
        State::new("Act")
    }

    /// Wait --ItemNew(event)--> Act --NewItem(output)--> Wait
    fn event_to_output() -> TransitionSystem<Sut> {
        let observe = ReactiveTransition {
            name: "observe".to_string(),
            tag: ActionTag::system("ItemNew"),
            from: wait(),
            to: act(),
            guard: Guard::system(|event, _| match event {
                Sut::ItemNew { guid } => GUIDS.contains(guid),
                _ => false,
            }),
            update: update(|action, vars| {
                if let Action::System(Sut::ItemNew { guid }) = action {
                    let id = GUIDS.iter().position(|g| g == guid).unwrap_or(0) as i32 + 1;
                    vars.set("id", id)?;
                }
                Ok(())
            }),
        };
        let report = ProactiveTransition {
            name: "report".to_string(),
            tag: ActionTag::model("NewItem"),
            from: act(),
            to: wait(),
            generate: generate(|vars| {
                let id = vars.get::<i32>("id")?;
                Ok(Action::Model(ModelAction::new("NewItem", vec![Value::Int(id)])))
            }),
            update: update(|_, vars| vars.clear("id").map(|_| ())),
        };

        TransitionSystem::new(
            "items",
            vec![wait(), act()],
            wait(),
            vec![observe.into(), report.into()],
        )
        .unwrap()
    }

    #[test]
    fn new_system_starts_in_initial_state() {
        let system = event_to_output();

        assert_eq!(system.current_state(), &wait());
        assert_eq!(system.initial_state(), &wait());
        assert!(system.is_idle());
        assert_eq!(system.transitions().len(), 2);
        assert!(system.variables().is_empty());
    }

    #[test]
    fn reactive_then_proactive_round_trip() {
        let mut system = event_to_output();
        let event = Action::System(Sut::ItemNew { guid: GUIDS[0] });

        let reactives = system.possible_reactive_transitions(&event);
        assert_eq!(reactives, vec![TransitionId(0)]);
        assert!(system.possible_proactive_transitions().is_empty());

        system.execute_reactive_transition(&event, reactives[0]).unwrap();
        assert_eq!(system.current_state(), &act());
        assert_eq!(system.variables().get::<i32>("id").unwrap(), 1);

        let proactives = system.possible_proactive_transitions();
        assert_eq!(proactives, vec![TransitionId(1)]);

        let output = system.execute_proactive_transition(proactives[0]).unwrap();
        assert_eq!(
            output,
            Action::Model(ModelAction::new("NewItem", vec![Value::Int(1)]))
        );
        assert_eq!(system.current_state(), &wait());
        assert!(!system.variables().contains("id"));
        assert_eq!(system.history().len(), 2);
        assert_eq!(system.history().get_path(), vec![&wait(), &act(), &wait()]);
    }

    #[test]
    fn guard_rejection_yields_no_candidates() {
        let system = event_to_output();
        let unknown = Action::System(Sut::ItemNew { guid: 1 });
        let wrong_tag = Action::System(Sut::Spawn { guid: GUIDS[0] });

        assert!(system.possible_reactive_transitions(&unknown).is_empty());
        assert!(system.possible_reactive_transitions(&wrong_tag).is_empty());
    }

    #[test]
    fn executing_impossible_transition_is_illegal() {
        let mut system = event_to_output();
        let unknown = Action::System(Sut::ItemNew { guid: 1 });

        let err = system
            .execute_reactive_transition(&unknown, TransitionId(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));

        let err = system.execute_proactive_transition(TransitionId(1)).unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));

        let err = system.execute_proactive_transition(TransitionId(42)).unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition { .. }));

        assert_eq!(system.current_state(), &wait());
        assert!(system.history().is_empty());
    }

    #[test]
    fn failing_update_leaves_state_unchanged() {
        let failing = ReactiveTransition::<Sut> {
            name: "failing".to_string(),
            tag: ActionTag::model("Go"),
            from: wait(),
            to: act(),
            guard: Guard::always(),
            update: update(|_, vars| {
                vars.set("written", true)?;
                vars.get::<i32>("missing").map(|_| ())
            }),
        };
        let mut system =
            TransitionSystem::new("fails", vec![wait(), act()], wait(), vec![failing.into()])
                .unwrap();
        let go = Action::Model(ModelAction::unit("Go"));

        let err = system
            .execute_reactive_transition(&go, TransitionId(0))
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Store(StoreError::NotBound { .. })
        ));
        assert_eq!(system.current_state(), &wait());
        assert!(system.variables().get::<bool>("written").unwrap());
        assert!(system.history().is_empty());
    }

    #[test]
    fn generated_action_must_match_declared_tag() {
        let liar = ProactiveTransition::<Sut> {
            name: "liar".to_string(),
            tag: ActionTag::model("Declared"),
            from: wait(),
            to: act(),
            generate: generate(|_| Ok(Action::System(Sut::Spawn { guid: 1 }))),
            update: no_update(),
        };
        let mut system =
            TransitionSystem::new("liar", vec![wait(), act()], wait(), vec![liar.into()]).unwrap();

        let err = system.execute_proactive_transition(TransitionId(0)).unwrap_err();

        assert!(matches!(err, EngineError::GeneratedTagMismatch { .. }));
        assert_eq!(system.current_state(), &wait());
    }

    #[test]
    fn construction_collects_all_violations() {
        let stray = ProactiveTransition::<Sut> {
            name: "stray".to_string(),
            tag: ActionTag::model("X"),
            from: State::new("Nowhere"),
            to: State::new("Elsewhere"),
            generate: generate(|_| Ok(Action::Model(ModelAction::unit("X")))),
            update: no_update(),
        };

        let result = TransitionSystem::new(
            "broken",
            vec![wait(), wait()],
            State::new("Start"),
            vec![stray.into()],
        );

        match result {
            Err(BuildError::Malformed { system, violations }) => {
                assert_eq!(system, "broken");
                assert_eq!(violations.len(), 4);
                assert!(violations.contains(&Violation::DuplicateState(wait())));
                assert!(violations.contains(&Violation::UnknownInitialState(State::new("Start"))));
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, Violation::UnknownSource { .. })));
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, Violation::UnknownTarget { .. })));
            }
            other => panic!("Expected malformed system, got {:?}", other.err()),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = TransitionSystem::<Sut>::new("", vec![wait()], wait(), vec![]);
        assert!(matches!(result, Err(BuildError::EmptyName)));
    }

    #[test]
    fn transition_lookup_by_name() {
        let system = event_to_output();

        assert_eq!(system.transition_id("report"), Some(TransitionId(1)));
        assert_eq!(system.transition_id("missing"), None);
        assert_eq!(system.transition(TransitionId(0)).unwrap().name(), "observe");
    }

    #[test]
    fn display_lists_structure() {
        let system = event_to_output();
        let text = system.to_string();

        assert!(text.contains("TransitionSystem (items)"));
        assert!(text.contains("CurrentState: Wait"));
        assert!(text.contains("proactive report (model:NewItem) Act -> Wait"));
    }
}
