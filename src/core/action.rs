//! Model actions, system actions, and their wire format.
//!
//! Actions come in two disjoint families:
//!
//! - **Model actions** are exchanged with the tester. They carry a name and
//!   an ordered list of primitive fields and travel as `Name(v1,v2,...)`.
//! - **System actions** are native to the system under test. The engine only
//!   needs their tag to match them against transitions.
//!
//! [`Action`] is the closed union of both families. Every transition declares
//! an [`ActionTag`], so matching an incoming action against a transition is a
//! tag comparison followed by the transition's guard.

use super::value::{Kind, Primitive, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors raised while encoding, decoding, or converting model actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("Malformed action text '{text}': {reason}")]
    Malformed { text: String, reason: String },

    #[error("Unknown model action '{name}'")]
    UnknownAction { name: String },

    #[error("Action '{name}' expects {expected} field(s), found {found}")]
    FieldCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Action '{name}' field {index}: '{text}' is not a valid {kind}")]
    InvalidField {
        name: String,
        index: usize,
        kind: Kind,
        text: String,
    },

    #[error("Action '{name}' field {index}: expected {expected}, found {found}")]
    FieldKind {
        name: String,
        index: usize,
        expected: Kind,
        found: Kind,
    },

    #[error("Expected action '{expected}', found '{found}'")]
    WrongAction { expected: String, found: String },
}

/// An action native to the system under test.
///
/// The payload is opaque to the engine; only [`SystemAction::tag`] is
/// inspected, to decide which transitions may consume or must produce it.
pub trait SystemAction: fmt::Debug + Send + 'static {
    /// Discriminator compared against [`ActionTag::System`].
    fn tag(&self) -> &str;
}

/// An abstract action exchanged with the test model.
///
/// Equality and hashing follow the canonical text form, so two actions are
/// equal exactly when they serialize identically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelAction {
    name: String,
    fields: Vec<Value>,
}

impl ModelAction {
    pub fn new(name: impl Into<String>, fields: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// An action without fields.
    pub fn unit(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Typed access to the field at `index`.
    ///
    /// Returns `None` if the index is out of range or the field has another kind.
    pub fn field<T: Primitive>(&self, index: usize) -> Option<T> {
        self.fields.get(index).and_then(T::from_value)
    }

    pub fn signature(&self) -> Signature {
        Signature::new(
            self.name.clone(),
            self.fields.iter().map(Value::kind).collect(),
        )
    }

    /// Canonical text form: `Name` without fields, otherwise
    /// `Name(v1,v2,...)` in field order. Embedded commas and parentheses are
    /// not escaped.
    pub fn serialize(&self) -> String {
        if self.fields.is_empty() {
            return self.name.clone();
        }
        let values: Vec<String> = self.fields.iter().map(Value::to_string).collect();
        format!("{}({})", self.name, values.join(","))
    }
}

impl PartialEq for ModelAction {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for ModelAction {}

impl Hash for ModelAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialize().hash(state);
    }
}

impl fmt::Display for ModelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// The family and name of the actions a transition consumes or produces.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ActionTag {
    Model(String),
    System(String),
}

impl ActionTag {
    pub fn model(name: impl Into<String>) -> Self {
        ActionTag::Model(name.into())
    }

    pub fn system(tag: impl Into<String>) -> Self {
        ActionTag::System(tag.into())
    }

    pub fn is_model(&self) -> bool {
        matches!(self, ActionTag::Model(_))
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTag::Model(name) => write!(f, "model:{name}"),
            ActionTag::System(tag) => write!(f, "system:{tag}"),
        }
    }
}

/// Either a model action or a system action of type `S`.
#[derive(Clone, Debug, PartialEq)]
pub enum Action<S> {
    Model(ModelAction),
    System(S),
}

impl<S: SystemAction> Action<S> {
    pub fn tag(&self) -> ActionTag {
        match self {
            Action::Model(action) => ActionTag::Model(action.name().to_string()),
            Action::System(action) => ActionTag::System(action.tag().to_string()),
        }
    }

    /// Whether this action belongs to the family and name `tag` declares.
    pub fn matches(&self, tag: &ActionTag) -> bool {
        match (self, tag) {
            (Action::Model(action), ActionTag::Model(name)) => action.name() == name,
            (Action::System(action), ActionTag::System(name)) => action.tag() == name,
            _ => false,
        }
    }

    pub fn as_model(&self) -> Option<&ModelAction> {
        match self {
            Action::Model(action) => Some(action),
            Action::System(_) => None,
        }
    }

    pub fn as_system(&self) -> Option<&S> {
        match self {
            Action::Model(_) => None,
            Action::System(action) => Some(action),
        }
    }

    /// Human-readable form for logs and diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Action::Model(action) => action.serialize(),
            Action::System(action) => format!("{action:?}"),
        }
    }
}

/// Name and ordered field kinds of a model action type.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub fields: Vec<Kind>,
}

impl Signature {
    pub fn new(name: impl Into<String>, fields: Vec<Kind>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Check that `action` has this signature's name, arity, and field kinds.
    pub fn check(&self, action: &ModelAction) -> Result<(), ActionError> {
        if action.name() != self.name {
            return Err(ActionError::WrongAction {
                expected: self.name.clone(),
                found: action.name().to_string(),
            });
        }
        if action.fields().len() != self.fields.len() {
            return Err(ActionError::FieldCount {
                name: self.name.clone(),
                expected: self.fields.len(),
                found: action.fields().len(),
            });
        }
        for (index, (value, kind)) in action.fields().iter().zip(&self.fields).enumerate() {
            if value.kind() != *kind {
                return Err(ActionError::FieldKind {
                    name: self.name.clone(),
                    index,
                    expected: *kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Parse the field list of a `Name(v1,v2,...)` text against this signature.
    fn parse_fields(&self, inner: &str) -> Result<Vec<Value>, ActionError> {
        if self.fields.is_empty() {
            if inner.is_empty() {
                return Ok(Vec::new());
            }
            return Err(ActionError::FieldCount {
                name: self.name.clone(),
                expected: 0,
                found: inner.split(',').count(),
            });
        }

        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() != self.fields.len() {
            return Err(ActionError::FieldCount {
                name: self.name.clone(),
                expected: self.fields.len(),
                found: parts.len(),
            });
        }

        parts
            .iter()
            .zip(&self.fields)
            .enumerate()
            .map(|(index, (part, kind))| {
                Value::parse(*kind, part).ok_or_else(|| ActionError::InvalidField {
                    name: self.name.clone(),
                    index,
                    kind: *kind,
                    text: part.to_string(),
                })
            })
            .collect()
    }
}

/// A concrete model action type with a fixed signature.
///
/// Usually generated with [`model_actions!`](crate::model_actions).
pub trait ActionType: Sized {
    const NAME: &'static str;

    fn signature() -> Signature;

    fn to_model_action(&self) -> ModelAction;

    fn from_model_action(action: &ModelAction) -> Result<Self, ActionError>;

    fn serialize(&self) -> String {
        self.to_model_action().serialize()
    }
}

/// Registry of known model action signatures, keyed by name.
///
/// # Example
///
/// ```rust
/// use refinery::core::{Catalog, Kind, ModelAction, Signature, Value};
///
/// let mut catalog = Catalog::new();
/// catalog.register(Signature::new("ConnectItem", vec![Kind::Int, Kind::Int]));
///
/// let action = catalog.deserialize("ConnectItem(1,2)").unwrap();
/// assert_eq!(action, ModelAction::new("ConnectItem", vec![Value::Int(1), Value::Int(2)]));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    signatures: HashMap<String, Signature>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signature, replacing any previous one with the same name.
    pub fn register(&mut self, signature: Signature) -> &mut Self {
        self.signatures.insert(signature.name.clone(), signature);
        self
    }

    /// Register the signature of a generated action type.
    pub fn register_type<T: ActionType>(&mut self) -> &mut Self {
        self.register(T::signature())
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Check an action against its registered signature.
    pub fn check(&self, action: &ModelAction) -> Result<(), ActionError> {
        self.signatures
            .get(action.name())
            .ok_or_else(|| ActionError::UnknownAction {
                name: action.name().to_string(),
            })?
            .check(action)
    }

    /// Parse `Name` or `Name(v1,v2,...)` into a model action.
    pub fn deserialize(&self, text: &str) -> Result<ModelAction, ActionError> {
        let (name, inner) = match text.find('(') {
            Some(open) => {
                let Some(inner) = text[open + 1..].strip_suffix(')') else {
                    return Err(ActionError::Malformed {
                        text: text.to_string(),
                        reason: "missing closing parenthesis".to_string(),
                    });
                };
                (&text[..open], inner)
            }
            None => (text, ""),
        };

        if name.is_empty() {
            return Err(ActionError::Malformed {
                text: text.to_string(),
                reason: "missing action name".to_string(),
            });
        }

        let signature = self
            .signatures
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction {
                name: name.to_string(),
            })?;

        let fields = signature.parse_fields(inner)?;
        Ok(ModelAction::new(name, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum SutEvent {
        ItemNew(u32),
        ItemRemoved,
    }

    impl SystemAction for SutEvent {
        fn tag(&self) -> &str {
            match self {
                Self::ItemNew(_) => "ItemNew",
                Self::ItemRemoved => "ItemRemoved",
            }
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .register(Signature::new("DeleteBegin", vec![]))
            .register(Signature::new("NewItem", vec![Kind::Int]))
            .register(Signature::new("ConnectItem", vec![Kind::Int, Kind::Int]))
            .register(Signature::new("Rename", vec![Kind::Int, Kind::Str, Kind::Bool]));
        catalog
    }

    #[test]
    fn serialize_matches_wire_format() {
        assert_eq!(ModelAction::unit("DeleteBegin").serialize(), "DeleteBegin");
        assert_eq!(
            ModelAction::new("NewItem", vec![Value::Int(1)]).serialize(),
            "NewItem(1)"
        );
        assert_eq!(
            ModelAction::new("ConnectItem", vec![Value::Int(1), Value::Int(2)]).serialize(),
            "ConnectItem(1,2)"
        );
    }

    #[test]
    fn booleans_travel_capitalized() {
        let mut catalog = Catalog::new();
        catalog.register(Signature::new("SetFlag", vec![Kind::Int, Kind::Bool]));
        let action = ModelAction::new("SetFlag", vec![Value::Int(1), Value::Bool(true)]);

        assert_eq!(action.serialize(), "SetFlag(1,True)");
        for text in ["SetFlag(1,True)", "SetFlag(1,true)", "SetFlag(1,TRUE)"] {
            assert_eq!(catalog.deserialize(text).unwrap(), action);
        }
        assert_eq!(
            catalog.deserialize("SetFlag(0,False)").unwrap().field::<bool>(1),
            Some(false)
        );
    }

    #[test]
    fn deserialize_inverts_serialize() {
        let catalog = catalog();
        for text in ["DeleteBegin", "NewItem(1)", "ConnectItem(1,2)", "Rename(3,box,True)"] {
            let action = catalog.deserialize(text).unwrap();
            assert_eq!(action.serialize(), text);
        }
    }

    #[test]
    fn equality_follows_text_form() {
        let a = ModelAction::new("NewItem", vec![Value::Int(1)]);
        let b = ModelAction::new("NewItem", vec![Value::Int(1)]);
        let c = ModelAction::new("NewItem", vec![Value::Int(2)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn deserialize_rejects_unknown_names() {
        assert_eq!(
            catalog().deserialize("Bogus(1)"),
            Err(ActionError::UnknownAction {
                name: "Bogus".to_string()
            })
        );
    }

    #[test]
    fn deserialize_rejects_wrong_arity() {
        assert!(matches!(
            catalog().deserialize("ConnectItem(1)"),
            Err(ActionError::FieldCount {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            catalog().deserialize("DeleteBegin(1)"),
            Err(ActionError::FieldCount { expected: 0, .. })
        ));
    }

    #[test]
    fn deserialize_rejects_bad_literals() {
        assert!(matches!(
            catalog().deserialize("NewItem(one)"),
            Err(ActionError::InvalidField {
                index: 0,
                kind: Kind::Int,
                ..
            })
        ));
    }

    #[test]
    fn deserialize_rejects_unbalanced_text() {
        assert!(matches!(
            catalog().deserialize("NewItem(1"),
            Err(ActionError::Malformed { .. })
        ));
        assert!(matches!(
            catalog().deserialize("(1)"),
            Err(ActionError::Malformed { .. })
        ));
    }

    #[test]
    fn signature_check_reports_kind_mismatch() {
        let action = ModelAction::new("NewItem", vec![Value::from("1")]);
        assert_eq!(
            catalog().check(&action),
            Err(ActionError::FieldKind {
                name: "NewItem".to_string(),
                index: 0,
                expected: Kind::Int,
                found: Kind::Str,
            })
        );
    }

    #[test]
    fn action_tags_distinguish_families() {
        let model: Action<SutEvent> = Action::Model(ModelAction::unit("ItemNew"));
        let system: Action<SutEvent> = Action::System(SutEvent::ItemNew(7));

        assert!(model.matches(&ActionTag::model("ItemNew")));
        assert!(!model.matches(&ActionTag::system("ItemNew")));
        assert!(system.matches(&ActionTag::system("ItemNew")));
        assert!(!system.matches(&ActionTag::system("ItemRemoved")));
        assert_eq!(system.tag(), ActionTag::system("ItemNew"));
        assert!(Action::<SutEvent>::System(SutEvent::ItemRemoved)
            .matches(&ActionTag::system("ItemRemoved")));
    }

    #[test]
    fn typed_field_access() {
        let action = ModelAction::new("Rename", vec![3.into(), "box".into(), true.into()]);

        assert_eq!(action.field::<i32>(0), Some(3));
        assert_eq!(action.field::<String>(1), Some("box".to_string()));
        assert_eq!(action.field::<bool>(2), Some(true));
        assert_eq!(action.field::<i32>(1), None);
        assert_eq!(action.field::<i32>(5), None);
    }
}
