//! Refinery: the refinement engine of a model-based test adapter
//!
//! A test model speaks in abstract *model actions*; the system under test
//! speaks in concrete *system actions*. Refinery translates between the two
//! with finite automata ("transition systems") that fix the legal orderings,
//! and a coordinating framework that feeds them from input and event queues.
//!
//! # Core Concepts
//!
//! - **Transition system**: states, a typed variable store, and transitions
//! - **Reactive transition**: consumes an action when its guard accepts it
//! - **Proactive transition**: produces an action on its own
//! - **Framework**: owns the systems, lets at most one run a behavior at a
//!   time, and reports a deadlock when a model input cannot be consumed
//!
//! # Example
//!
//! ```rust
//! use refinery::builder::{ProactiveBuilder, ReactiveBuilder, TransitionSystemBuilder};
//! use refinery::core::{Action, SystemAction, Value};
//! use refinery::framework::{Framework, FrameworkConfig};
//! use refinery::model_actions;
//!
//! model_actions! {
//!     pub struct NewItem {
//!         id: i32,
//!     }
//! }
//!
//! #[derive(Debug, PartialEq)]
//! enum Sut {
//!     CreateItem(i32),
//! }
//!
//! impl SystemAction for Sut {
//!     fn tag(&self) -> &str {
//!         "CreateItem"
//!     }
//! }
//!
//! let system = TransitionSystemBuilder::<Sut>::new("create")
//!     .states(["Idle", "Creating"])
//!     .initial("Idle")
//!     .transition(
//!         ReactiveBuilder::new("request")
//!             .on_model("NewItem")
//!             .from("Idle")
//!             .to("Creating")
//!             .update(|action, vars| match action.as_model().and_then(|m| m.field(0)) {
//!                 Some(id) => vars.set("id", Value::Int(id)),
//!                 None => Ok(()),
//!             }),
//!     )
//!     .unwrap()
//!     .transition(
//!         ProactiveBuilder::new("create")
//!             .emits_system("CreateItem")
//!             .from("Creating")
//!             .to("Idle")
//!             .generate(|vars| Ok(Action::System(Sut::CreateItem(vars.get("id")?)))),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let (framework, mut outlets) = Framework::new(FrameworkConfig::default());
//! framework.add_system(system).unwrap();
//! framework.handle_model_input(NewItem { id: 7 }).unwrap();
//!
//! assert_eq!(outlets.commands.try_recv().unwrap(), Sut::CreateItem(7));
//! ```

pub mod builder;
pub mod core;
pub mod framework;
pub mod snapshot;
pub mod system;

// Re-export commonly used types
pub use crate::core::{Action, ActionTag, ModelAction, State, SystemAction, VariableStore};
pub use crate::framework::{Framework, FrameworkConfig, Outlets};
pub use crate::system::{EngineError, TransitionSystem};
