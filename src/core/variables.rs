//! Typed variable storage scoped to one transition system.
//!
//! A variable's kind is fixed by its first binding. Rebinding a name to a
//! different kind is rejected and leaves the old binding untouched. The store
//! has no synchronization of its own: it is only ever reached through its
//! owning transition system, which the framework guards with its lock.

use super::value::{Kind, Primitive, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by [`VariableStore`] operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Variable name must not be empty")]
    InvalidArgument,

    #[error("Cannot rebind variable '{name}' from {bound} to {attempted}")]
    TypeConflict {
        name: String,
        bound: Kind,
        attempted: Kind,
    },

    #[error("Variable '{name}' is not set")]
    NotBound { name: String },

    #[error("Variable '{name}' holds {stored}, requested {requested}")]
    TypeMismatch {
        name: String,
        stored: Kind,
        requested: Kind,
    },
}

/// Named, kind-checked variables.
///
/// # Example
///
/// ```rust
/// use refinery::core::{StoreError, VariableStore};
///
/// let mut vars = VariableStore::new();
/// vars.set("id", 5).unwrap();
///
/// assert!(matches!(
///     vars.set("id", "text"),
///     Err(StoreError::TypeConflict { .. })
/// ));
/// assert_eq!(vars.get::<i32>("id").unwrap(), 5);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    values: BTreeMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`.
    ///
    /// Fails with [`StoreError::TypeConflict`] if `name` currently holds a
    /// value of another kind; the existing binding is kept in that case.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument);
        }

        let value = value.into();
        if let Some(existing) = self.values.get(name) {
            if existing.kind() != value.kind() {
                return Err(StoreError::TypeConflict {
                    name: name.to_string(),
                    bound: existing.kind(),
                    attempted: value.kind(),
                });
            }
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Read `name` as a `T`.
    pub fn get<T: Primitive>(&self, name: &str) -> Result<T, StoreError> {
        let value = self.value(name)?;
        T::from_value(value).ok_or_else(|| StoreError::TypeMismatch {
            name: name.to_string(),
            stored: value.kind(),
            requested: T::KIND,
        })
    }

    /// Read `name` without a kind expectation.
    pub fn value(&self, name: &str) -> Result<&Value, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument);
        }
        self.values.get(name).ok_or_else(|| StoreError::NotBound {
            name: name.to_string(),
        })
    }

    /// Remove the binding for `name`, returning the value it held.
    ///
    /// Clearing a name that is not set is an error ([`StoreError::NotBound`]).
    /// After clearing, the name may be bound again with any kind.
    pub fn clear(&mut self, name: &str) -> Result<Value, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument);
        }
        self.values.remove(name).ok_or_else(|| StoreError::NotBound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{name} ({}, {value})", value.kind())?;
        }
        Ok(())
    }
}
