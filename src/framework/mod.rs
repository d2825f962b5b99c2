//! Coordinating framework: owns the transition systems and schedules them.
//!
//! Producers on any thread hand model inputs and system events to a
//! [`Framework`]; each call enqueues and then runs the scheduling loop under
//! one lock. Produced model outputs and system commands leave through the
//! unbounded channels in [`Outlets`], so the lock is never held across I/O.
//!
//! # Example
//!
//! ```rust
//! use refinery::builder::{ProactiveBuilder, ReactiveBuilder, TransitionSystemBuilder};
//! use refinery::core::{ModelAction, SystemAction, Value};
//! use refinery::framework::{Framework, FrameworkConfig};
//!
//! #[derive(Debug)]
//! struct NoCommands;
//!
//! impl SystemAction for NoCommands {
//!     fn tag(&self) -> &str {
//!         "NoCommands"
//!     }
//! }
//!
//! let system = TransitionSystemBuilder::<NoCommands>::new("items")
//!     .states(["S1", "S2"])
//!     .initial("S1")
//!     .transition(
//!         ReactiveBuilder::new("T1")
//!             .on_model("NewItem")
//!             .from("S1")
//!             .to("S2")
//!             .when_model(|action, _| action.field::<i32>(0) == Some(1)),
//!     )
//!     .unwrap()
//!     .transition(
//!         ProactiveBuilder::new("T2")
//!             .from("S2")
//!             .to("S1")
//!             .generate_model("ItemCreated", |_| {
//!                 Ok(ModelAction::new("ItemCreated", vec![Value::Int(1)]))
//!             }),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let (framework, mut outlets) = Framework::new(FrameworkConfig::default());
//! framework.add_system(system).unwrap();
//! framework
//!     .handle_model_input(ModelAction::new("NewItem", vec![Value::Int(1)]))
//!     .unwrap();
//!
//! assert_eq!(outlets.outputs.try_recv().unwrap(), "ItemCreated(1)");
//! assert!(framework.current_system().is_none());
//! ```

mod config;
mod engine;
mod select;

pub use config::{ConfigError, FrameworkConfig, SelectionConfig};
pub use select::{FirstSelector, RandomSelector, Selector};

use crate::core::{Catalog, ModelAction, State, SystemAction};
use crate::snapshot::Snapshot;
use crate::system::{EngineError, SystemId, TransitionSystem};
use engine::Engine;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, info_span, Span};

/// Receiving ends of the framework's outbound hand-offs.
pub struct Outlets<S> {
    /// Model outputs in wire form, `Name(v1,v2,...)`
    pub outputs: UnboundedReceiver<String>,
    /// Commands for the system under test
    pub commands: UnboundedReceiver<S>,
}

/// Shared handle to a coordinating framework.
///
/// Cloning is cheap and every clone drives the same framework.
pub struct Framework<S> {
    engine: Arc<Mutex<Engine<S>>>,
    span: Span,
}

impl<S> Clone for Framework<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            span: self.span.clone(),
        }
    }
}

impl<S: SystemAction> Framework<S> {
    pub fn new(config: FrameworkConfig) -> (Self, Outlets<S>) {
        let (output_tx, outputs) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let span = info_span!("refinement", framework = %config.name);
        let engine = Engine::new(
            config.name,
            config.selection.selector(),
            config.step_limit,
            output_tx,
            command_tx,
        );

        let framework = Self {
            engine: Arc::new(Mutex::new(engine)),
            span,
        };
        (framework, Outlets { outputs, commands })
    }

    /// Replace the tie-breaking strategy.
    pub fn with_selector(self, selector: impl Selector + 'static) -> Self {
        self.engine.lock().selector = Box::new(selector);
        self
    }

    /// Decode serialized inputs with `catalog`, and reject systems whose
    /// model tags it does not know.
    ///
    /// Systems registered earlier are checked too; on failure the previous
    /// catalog, if any, stays in place.
    pub fn with_catalog(self, catalog: Catalog) -> Result<Self, EngineError> {
        self.engine.lock().set_catalog(catalog)?;
        Ok(self)
    }

    /// Run scheduling inside `span` instead of the default `refinement` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Register a system. It becomes eligible the next time the queues are checked.
    ///
    /// The system must be in its initial state. A system handed back by
    /// [`remove_system`](Self::remove_system) mid-cycle is rejected with
    /// [`EngineError::SystemNotIdle`].
    pub fn add_system(&self, system: TransitionSystem<S>) -> Result<SystemId, EngineError> {
        let _entered = self.span.enter();
        self.engine.lock().add_system(system)
    }

    /// Unregister a system, releasing the floor if it held it.
    ///
    /// The system is returned as it was, possibly mid-cycle.
    pub fn remove_system(&self, id: SystemId) -> Option<TransitionSystem<S>> {
        let _entered = self.span.enter();
        self.engine.lock().remove_system(id)
    }

    /// Give purely proactive systems their first chance to fire.
    pub fn start(&self) -> Result<(), EngineError> {
        let _entered = self.span.enter();
        info!("Framework started");
        self.engine.lock().check_systems()
    }

    /// Fire transitions until no queue can make progress.
    ///
    /// Fails with [`EngineError::Deadlock`] when a queued model input cannot
    /// be consumed, leaving it queued.
    pub fn check_systems(&self) -> Result<(), EngineError> {
        let _entered = self.span.enter();
        self.engine.lock().check_systems()
    }

    /// Enqueue a model input and schedule.
    pub fn handle_model_input(&self, input: impl Into<ModelAction>) -> Result<(), EngineError> {
        let _entered = self.span.enter();
        let mut engine = self.engine.lock();
        engine.inputs.push_back(input.into());
        engine.check_systems()
    }

    /// Decode a wire-form model input with the registered catalog, enqueue it, and schedule.
    pub fn handle_serialized_input(&self, text: &str) -> Result<(), EngineError> {
        let _entered = self.span.enter();
        let mut engine = self.engine.lock();
        let catalog = engine
            .catalog
            .as_ref()
            .ok_or_else(|| EngineError::NoCatalog(text.to_string()))?;
        let input = catalog.deserialize(text)?;
        engine.inputs.push_back(input);
        engine.check_systems()
    }

    /// Enqueue a system event and schedule.
    pub fn handle_system_event(&self, event: S) -> Result<(), EngineError> {
        let _entered = self.span.enter();
        let mut engine = self.engine.lock();
        engine.events.push_back(event);
        engine.check_systems()
    }

    /// Serialize `output` and hand it to the model side.
    pub fn send_model_output(&self, output: &ModelAction) -> Result<(), EngineError> {
        self.engine.lock().send_model_output(output)
    }

    /// Hand `command` to the system under test.
    pub fn send_system_command(&self, command: S) -> Result<(), EngineError> {
        self.engine.lock().send_system_command(command)
    }

    /// The system currently holding exclusive scheduling rights.
    pub fn current_system(&self) -> Option<SystemId> {
        self.engine.lock().current
    }

    pub fn pending_inputs(&self) -> usize {
        self.engine.lock().inputs.len()
    }

    pub fn pending_events(&self) -> usize {
        self.engine.lock().events.len()
    }

    /// Registered systems in registration order.
    pub fn system_ids(&self) -> Vec<SystemId> {
        self.engine.lock().systems.iter().map(|s| s.id()).collect()
    }

    /// Inspect a registered system under the lock.
    pub fn with_system<R>(
        &self,
        id: SystemId,
        f: impl FnOnce(&TransitionSystem<S>) -> R,
    ) -> Option<R> {
        self.engine.lock().system(id).map(f)
    }

    pub fn current_state(&self, id: SystemId) -> Option<State> {
        self.with_system(id, |system| system.current_state().clone())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.lock().snapshot()
    }
}

impl<S> fmt::Display for Framework<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.engine.lock())
    }
}
