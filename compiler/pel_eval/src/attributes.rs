//! Attribute resolution: dotted-path accessors over activations.
//!
//! An `Attribute` is a root variable plus a chain of qualifiers, resolved
//! step by step against one activation. Qualifiers built in presence-only
//! mode turn a missing field into the absent answer (`Ok(None)`) instead of
//! an error; qualifying into a value that can never carry fields is a hard
//! error either way.
//!
//! Qualifier construction is statically checked: a segment against a type
//! that can never carry fields (a scalar, a list) fails up front.

use pel_ir::ExprId;
use pel_types::Type;
use std::fmt;

use crate::errors::{cannot_access_field, EvalError};
use crate::{Activation, Value};

/// A qualifier could not be constructed against the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeResolutionError {
    pub message: String,
}

impl TypeResolutionError {
    fn new(message: impl Into<String>) -> Self {
        TypeResolutionError { message: message.into() }
    }
}

impl fmt::Display for TypeResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TypeResolutionError {}

/// One step of a dotted path.
#[derive(Clone, Debug)]
pub struct Qualifier {
    id: ExprId,
    field: String,
    presence_only: bool,
}

impl Qualifier {
    /// Build a field qualifier against the statically known type of the
    /// value it will qualify. Fails when that type can never carry fields.
    pub fn new(
        ty: &Type,
        id: ExprId,
        field: &str,
        presence_only: bool,
    ) -> Result<Self, TypeResolutionError> {
        if !ty.supports_field_selection() {
            return Err(TypeResolutionError::new(format!(
                "field `{field}` cannot be selected from type {ty}"
            )));
        }
        Ok(Qualifier { id, field: field.to_owned(), presence_only })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Node id of the expression this qualifier was compiled for.
    pub fn id(&self) -> ExprId {
        self.id
    }
}

/// A resolvable dotted path rooted at a variable.
#[derive(Clone, Debug)]
pub struct Attribute {
    id: ExprId,
    root: String,
    qualifiers: Vec<Qualifier>,
}

impl Attribute {
    /// An absolute attribute rooted at variable `root`.
    pub fn absolute(id: ExprId, root: &str) -> Self {
        Attribute { id, root: root.to_owned(), qualifiers: Vec::new() }
    }

    #[must_use]
    pub fn add_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Node id of the expression this attribute was compiled for.
    pub fn id(&self) -> ExprId {
        self.id
    }

    /// Resolve against an activation.
    ///
    /// `Ok(None)` is the absent answer: the root is unbound, or a
    /// presence-only qualifier hit a missing field. Hard failures (field
    /// access on a scalar, missing field under a strict qualifier) are
    /// `Err`.
    pub fn resolve(&self, activation: &dyn Activation) -> Result<Option<Value>, EvalError> {
        let Some(mut current) = activation.resolve(&self.root) else {
            return Ok(None);
        };
        for qualifier in &self.qualifiers {
            let next = match current.field(&qualifier.field) {
                Some(Some(value)) => value.clone(),
                Some(None) => {
                    if qualifier.presence_only {
                        return Ok(None);
                    }
                    return Err(crate::errors::no_such_field(&qualifier.field));
                }
                None => {
                    return Err(cannot_access_field(current.type_name(), &qualifier.field));
                }
            };
            current = next;
        }
        Ok(Some(current))
    }
}
