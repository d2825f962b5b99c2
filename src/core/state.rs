//! Named automaton states.
//!
//! A state is a pure identity value: two states are the same state exactly
//! when their names are equal. States never change once created.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named location in a transition system.
///
/// # Example
///
/// ```rust
/// use refinery::core::State;
///
/// let wait = State::new("Wait");
/// assert_eq!(wait, State::new("Wait"));
/// assert_ne!(wait, State::new("Act"));
/// assert_eq!(wait.name(), "Wait");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    name: String,
}

impl State {
    /// Create a state with the given name.
    ///
    /// Empty names are rejected when the owning transition system is built,
    /// not here.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The state's name, which is also its identity.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_by_name() {
        assert_eq!(State::new("Wait"), State::new("Wait"));
        assert_ne!(State::new("Wait"), State::new("wait"));
    }

    #[test]
    fn states_hash_by_name() {
        let mut states = HashSet::new();
        states.insert(State::new("Wait"));
        states.insert(State::new("Wait"));
        states.insert(State::new("Act"));

        assert_eq!(states.len(), 2);
    }

    #[test]
    fn display_is_the_name() {
        assert_eq!(State::new("Act").to_string(), "Act");
    }

    #[test]
    fn state_serializes_as_plain_name() {
        let json = serde_json::to_string(&State::new("Wait")).unwrap();
        assert_eq!(json, "\"Wait\"");

        let state: State = serde_json::from_str(&json).unwrap();
        assert_eq!(state, State::new("Wait"));
    }
}
