//! Record of executed transitions.
//!
//! Every transition a system executes is appended to its history, giving
//! tests and diagnostics the exact path the automaton took.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Whether a transition consumed an action or produced one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Consumes a model input or a system event.
    Reactive,
    /// Produces a model output or a system command.
    Proactive,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Reactive => f.write_str("reactive"),
            TransitionKind::Proactive => f.write_str("proactive"),
        }
    }
}

/// One executed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Firing {
    /// Name of the transition that fired
    pub transition: String,
    pub kind: TransitionKind,
    pub from: State,
    pub to: State,
    /// Text form of the consumed or produced action
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered firings of one transition system.
///
/// # Example
///
/// ```rust
/// use refinery::core::{Firing, FiringHistory, State, TransitionKind};
/// use chrono::Utc;
///
/// let mut history = FiringHistory::new();
/// history.record(Firing {
///     transition: "T1".to_string(),
///     kind: TransitionKind::Reactive,
///     from: State::new("S1"),
///     to: State::new("S2"),
///     action: "NewItem(1)".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![&State::new("S1"), &State::new("S2")]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FiringHistory {
    firings: Vec<Firing>,
}

impl FiringHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, firing: Firing) {
        self.firings.push(firing);
    }

    /// States traversed: the first source, then each target in order.
    pub fn get_path(&self) -> Vec<&State> {
        let mut path = Vec::new();
        if let Some(first) = self.firings.first() {
            path.push(&first.from);
        }
        for firing in &self.firings {
            path.push(&firing.to);
        }
        path
    }

    /// Time between the first and last firing, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.firings.first(), self.firings.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn firings(&self) -> &[Firing] {
        &self.firings
    }

    pub fn last(&self) -> Option<&Firing> {
        self.firings.last()
    }

    pub fn len(&self) -> usize {
        self.firings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firings.is_empty()
    }
}
