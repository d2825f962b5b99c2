//! Lock-protected state of the coordinating framework and its scheduling loop.

use super::select::Selector;
use crate::core::{Action, ActionTag, Catalog, ModelAction, SystemAction};
use crate::snapshot::{Snapshot, SystemSnapshot};
use crate::system::{EngineError, SystemId, TransitionId, TransitionSystem};
use std::collections::VecDeque;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

/// Outcome of one scheduling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// A transition executed.
    Fired,
    /// An unmatched system event was dropped.
    Discarded,
    /// Nothing could be done.
    Idle,
}

/// Everything the framework lock protects.
pub(crate) struct Engine<S> {
    pub(crate) name: String,
    pub(crate) systems: Vec<TransitionSystem<S>>,
    pub(crate) current: Option<SystemId>,
    pub(crate) inputs: VecDeque<ModelAction>,
    pub(crate) events: VecDeque<S>,
    pub(crate) selector: Box<dyn Selector>,
    pub(crate) catalog: Option<Catalog>,
    pub(crate) step_limit: Option<usize>,
    outputs: UnboundedSender<String>,
    commands: UnboundedSender<S>,
}

impl<S: SystemAction> Engine<S> {
    pub(crate) fn new(
        name: String,
        selector: Box<dyn Selector>,
        step_limit: Option<usize>,
        outputs: UnboundedSender<String>,
        commands: UnboundedSender<S>,
    ) -> Self {
        Self {
            name,
            systems: Vec::new(),
            current: None,
            inputs: VecDeque::new(),
            events: VecDeque::new(),
            selector,
            catalog: None,
            step_limit,
            outputs,
            commands,
        }
    }

    /// Register a system, checking its model tags against the catalog if one is set.
    ///
    /// Only idle systems are accepted: a system that left its initial state
    /// would be mid-behavior without holding the floor.
    pub(crate) fn add_system(
        &mut self,
        system: TransitionSystem<S>,
    ) -> Result<SystemId, EngineError> {
        if !system.is_idle() {
            return Err(EngineError::SystemNotIdle {
                system: system.name().to_string(),
                state: system.current_state().clone(),
            });
        }
        if let Some(catalog) = &self.catalog {
            check_catalog(catalog, &system)?;
        }

        let id = system.id();
        info!(system = %system.name(), id = %id, "Transition system added");
        self.systems.push(system);
        Ok(id)
    }

    /// Install `catalog` after checking every registered system against it.
    pub(crate) fn set_catalog(&mut self, catalog: Catalog) -> Result<(), EngineError> {
        for system in &self.systems {
            check_catalog(&catalog, system)?;
        }
        debug!(actions = catalog.len(), "Catalog installed");
        self.catalog = Some(catalog);
        Ok(())
    }

    pub(crate) fn remove_system(&mut self, id: SystemId) -> Option<TransitionSystem<S>> {
        let index = self.systems.iter().position(|s| s.id() == id)?;
        let system = self.systems.remove(index);
        if self.current == Some(id) {
            self.current = None;
            info!(system = %system.name(), "Active transition system removed, floor released");
        }
        info!(system = %system.name(), id = %id, "Transition system removed");
        Some(system)
    }

    /// Drain the queues until nothing more can fire.
    ///
    /// Each step tries, in order: one proactive transition, one queued system
    /// event, the oldest queued model input. Unmatched events are dropped;
    /// an unmatched input stays queued and ends the run in a deadlock.
    pub(crate) fn check_systems(&mut self) -> Result<(), EngineError> {
        let mut fired = 0usize;
        loop {
            match self.step(fired)? {
                Step::Fired => fired += 1,
                Step::Discarded => {}
                Step::Idle => break,
            }
        }

        if !self.inputs.is_empty() || !self.events.is_empty() {
            let snapshot = self.snapshot();
            error!(
                pending_inputs = self.inputs.len(),
                pending_events = self.events.len(),
                "Deadlock: no enabled transition accepts the queued work\n{snapshot}"
            );
            return Err(EngineError::Deadlock(Box::new(snapshot)));
        }

        debug!(fired, "Scheduling run complete");
        Ok(())
    }

    /// Run one step. `fired` counts the transitions this run has executed so far.
    fn step(&mut self, fired: usize) -> Result<Step, EngineError> {
        let proactive = self.proactive_candidates();
        if !proactive.is_empty() {
            if let Some(limit) = self.limit_reached(fired) {
                return Err(self.step_limit_error(limit));
            }
            let (index, id) = self.choose(&proactive);
            let action = self.systems[index].execute_proactive_transition(id)?;
            self.fired(index, id, &action);
            self.dispatch(action)?;
            return Ok(Step::Fired);
        }

        if let Some(event) = self.events.pop_front() {
            let action = Action::System(event);
            let reactive = self.reactive_candidates(&action);
            if reactive.is_empty() {
                warn!(event = %action.describe(), "No transition accepts system event, discarding");
                return Ok(Step::Discarded);
            }
            if let Some(limit) = self.limit_reached(fired) {
                if let Action::System(event) = action {
                    self.events.push_front(event);
                }
                return Err(self.step_limit_error(limit));
            }
            let (index, id) = self.choose(&reactive);
            self.systems[index].execute_reactive_transition(&action, id)?;
            self.fired(index, id, &action);
            return Ok(Step::Fired);
        }

        if let Some(input) = self.inputs.front() {
            let action = Action::Model(input.clone());
            let reactive = self.reactive_candidates(&action);
            if reactive.is_empty() {
                debug!(input = %input, "No transition accepts model input");
                return Ok(Step::Idle);
            }
            if let Some(limit) = self.limit_reached(fired) {
                return Err(self.step_limit_error(limit));
            }
            let (index, id) = self.choose(&reactive);
            self.systems[index].execute_reactive_transition(&action, id)?;
            self.inputs.pop_front();
            self.fired(index, id, &action);
            return Ok(Step::Fired);
        }

        Ok(Step::Idle)
    }

    /// The configured limit, if this run has already used it up.
    fn limit_reached(&self, fired: usize) -> Option<usize> {
        self.step_limit.filter(|limit| fired >= *limit)
    }

    fn step_limit_error(&self, limit: usize) -> EngineError {
        error!(limit, "Step limit reached with transitions still enabled");
        EngineError::StepLimitExceeded {
            limit,
            snapshot: Box::new(self.snapshot()),
        }
    }

    /// Systems whose transitions may fire: the active one, or all when the floor is free.
    fn in_scope(&self) -> impl Iterator<Item = (usize, &TransitionSystem<S>)> {
        let current = self.current;
        self.systems
            .iter()
            .enumerate()
            .filter(move |(_, system)| current.map_or(true, |id| system.id() == id))
    }

    fn proactive_candidates(&self) -> Vec<(usize, TransitionId)> {
        let candidates: Vec<_> = self
            .in_scope()
            .flat_map(|(index, system)| {
                system
                    .possible_proactive_transitions()
                    .into_iter()
                    .map(move |id| (index, id))
            })
            .collect();
        if !candidates.is_empty() {
            debug!(candidates = candidates.len(), "Proactive transitions enabled");
        }
        candidates
    }

    fn reactive_candidates(&self, action: &Action<S>) -> Vec<(usize, TransitionId)> {
        let candidates: Vec<_> = self
            .in_scope()
            .flat_map(|(index, system)| {
                system
                    .possible_reactive_transitions(action)
                    .into_iter()
                    .map(move |id| (index, id))
            })
            .collect();
        debug!(
            action = %action.describe(),
            candidates = candidates.len(),
            "Reactive transitions enabled"
        );
        candidates
    }

    fn choose(&mut self, candidates: &[(usize, TransitionId)]) -> (usize, TransitionId) {
        let pick = self
            .selector
            .select(candidates.len())
            .min(candidates.len() - 1);
        candidates[pick]
    }

    /// Claim the floor for the system that just fired, and release it once
    /// that system is back in its initial state.
    fn fired(&mut self, index: usize, id: TransitionId, action: &Action<S>) {
        let system = &self.systems[index];
        info!(
            system = %system.name(),
            transition = %system.transition(id).map(|t| t.name()).unwrap_or_default(),
            state = %system.current_state(),
            action = %action.describe(),
            "Transition fired"
        );

        if self.current.is_none() {
            self.current = Some(system.id());
            info!(system = %system.name(), "Transition system claimed the floor");
        }
        if system.is_idle() {
            self.current = None;
            info!(system = %system.name(), "Transition system completed a cycle, floor released");
        }
    }

    /// Hand a produced action to its collaborator.
    pub(crate) fn dispatch(&self, action: Action<S>) -> Result<(), EngineError> {
        match action {
            Action::Model(output) => self.send_model_output(&output),
            Action::System(command) => self.send_system_command(command),
        }
    }

    pub(crate) fn send_model_output(&self, output: &ModelAction) -> Result<(), EngineError> {
        let text = output.serialize();
        debug!(output = %text, "Sending model output");
        self.outputs
            .send(text)
            .map_err(|e| EngineError::OutputClosed(e.0))
    }

    pub(crate) fn send_system_command(&self, command: S) -> Result<(), EngineError> {
        debug!(command = ?command, "Sending system command");
        self.commands
            .send(command)
            .map_err(|e| EngineError::CommandClosed(format!("{:?}", e.0)))
    }

    pub(crate) fn system(&self, id: SystemId) -> Option<&TransitionSystem<S>> {
        self.systems.iter().find(|s| s.id() == id)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.name.clone(),
            self.current,
            self.systems.iter().map(SystemSnapshot::capture).collect(),
            self.inputs.iter().map(ModelAction::serialize).collect(),
            self.events.iter().map(|e| format!("{e:?}")).collect(),
        )
    }
}

/// Every model action `system` consumes or produces must be known to `catalog`.
fn check_catalog<S>(catalog: &Catalog, system: &TransitionSystem<S>) -> Result<(), EngineError> {
    for transition in system.transitions() {
        if let ActionTag::Model(name) = transition.tag() {
            if !catalog.contains(name) {
                return Err(EngineError::UnknownAction {
                    system: system.name().to_string(),
                    action: name.clone(),
                });
            }
        }
    }
    Ok(())
}

impl<S> fmt::Display for Engine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Framework '{}'", self.name)?;
        let current = self
            .current
            .and_then(|id| self.systems.iter().find(|s| s.id() == id));
        match current {
            Some(system) => writeln!(f, "CurrentSystem: {}", system.name())?,
            None => writeln!(f, "CurrentSystem: none")?,
        }
        writeln!(
            f,
            "Pending inputs: {}, pending events: {}",
            self.inputs.len(),
            self.events.len()
        )?;
        for system in &self.systems {
            writeln!(f, "{system}")?;
        }
        Ok(())
    }
}
