//! Point-in-time diagnostics of a coordinating framework.
//!
//! A snapshot records which system holds the floor, the state and variables
//! of every registered system, and both pending queues. Deadlock and step
//! limit failures carry one, and [`Framework::snapshot`] takes one on demand.
//! Snapshots contain no transitions (closures are not serializable), so they
//! describe a run but cannot restore it.
//!
//! [`Framework::snapshot`]: crate::framework::Framework::snapshot

use crate::core::{State, VariableStore};
use crate::system::{SystemId, TransitionSystem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// State of one registered transition system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub id: SystemId,
    pub name: String,
    pub initial_state: State,
    pub current_state: State,
    pub variables: VariableStore,
    /// Number of transitions executed so far
    pub firings: usize,
}

impl SystemSnapshot {
    pub fn capture<S>(system: &TransitionSystem<S>) -> Self {
        Self {
            id: system.id(),
            name: system.name().to_string(),
            initial_state: system.initial_state().clone(),
            current_state: system.current_state().clone(),
            variables: system.variables().clone(),
            firings: system.history().len(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_state == self.initial_state
    }
}

/// Serializable diagnostic of framework state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    pub taken_at: DateTime<Utc>,

    /// Name of the framework the snapshot was taken from
    pub framework: String,

    /// System holding exclusive scheduling rights, if any
    pub current_system: Option<SystemId>,

    /// Registered systems in registration order
    pub systems: Vec<SystemSnapshot>,

    /// Queued model inputs in wire form, oldest first
    pub pending_inputs: Vec<String>,

    /// Queued system events in debug form, oldest first
    pub pending_events: Vec<String>,
}

impl Snapshot {
    pub fn new(
        framework: impl Into<String>,
        current_system: Option<SystemId>,
        systems: Vec<SystemSnapshot>,
        pending_inputs: Vec<String>,
        pending_events: Vec<String>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            taken_at: Utc::now(),
            framework: framework.into(),
            current_system,
            systems,
            pending_inputs,
            pending_events,
        }
    }

    /// Look a system up by name.
    pub fn system(&self, name: &str) -> Option<&SystemSnapshot> {
        self.systems.iter().find(|s| s.name == name)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting unsupported versions.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    /// Serialize to the compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from the compact binary format, rejecting unsupported versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

/// Multi-line report naming the active system, every system's state, and
/// both queues.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Framework '{}' at {}",
            self.framework,
            self.taken_at.to_rfc3339()
        )?;
        match self.current_system.and_then(|id| self.systems.iter().find(|s| s.id == id)) {
            Some(system) => writeln!(f, "CurrentSystem: {} [{}]", system.name, system.id)?,
            None => writeln!(f, "CurrentSystem: none")?,
        }
        writeln!(f, "Systems:")?;
        for system in &self.systems {
            writeln!(
                f,
                "\t{} [{}]: {} (initial {}) variables: {}",
                system.name, system.id, system.current_state, system.initial_state, system.variables
            )?;
        }
        writeln!(f, "Pending inputs ({}):", self.pending_inputs.len())?;
        for input in &self.pending_inputs {
            writeln!(f, "\t{input}")?;
        }
        write!(f, "Pending events ({}):", self.pending_events.len())?;
        for event in &self.pending_events {
            write!(f, "\n\t{event}")?;
        }
        Ok(())
    }
}
