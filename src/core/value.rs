//! Primitive values shared by variable stores and model action fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of supported primitive kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Kind {
    Bool,
    Int,
    Str,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Str => "string",
        };
        f.write_str(name)
    }
}

/// A dynamically typed primitive value.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Str(String),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Str(_) => Kind::Str,
        }
    }

    /// Parse the textual form of a value of the given kind.
    ///
    /// Returns `None` if `text` is not a valid literal for `kind`. Booleans
    /// are matched ignoring case. Strings always parse, verbatim.
    pub fn parse(kind: Kind, text: &str) -> Option<Value> {
        match kind {
            Kind::Bool => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            Kind::Int => text.trim().parse().ok().map(Value::Int),
            Kind::Str => Some(Value::Str(text.to_string())),
        }
    }
}

/// Textual form used on the wire: `True`/`False`, decimal integers, raw strings.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

/// Rust types that map onto exactly one [`Kind`].
pub trait Primitive: Sized {
    const KIND: Kind;

    /// Extract a value of this type, or `None` if `value` has another kind.
    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

impl Primitive for bool {
    const KIND: Kind = Kind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl Primitive for i32 {
    const KIND: Kind = Kind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl Primitive for String {
    const KIND: Kind = Kind::Str;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}
