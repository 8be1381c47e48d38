//! Evaluation errors.
//!
//! Constructors for the common failure shapes live here so call sites read
//! as `Err(no_such_variable(name))`. They are `#[cold]`: the happy path
//! never allocates an error message.

use pel_ir::Span;
use std::fmt;

/// Result of evaluation.
pub type EvalResult = Result<crate::Value, EvalError>;

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Error message.
    pub message: String,
    /// Source location, when the failing node is known.
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError { message: message.into(), span: None }
    }

    /// Attach a source span to this error.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (at {:?})", self.message, span),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for EvalError {}

#[cold]
pub fn no_such_variable(name: &str) -> EvalError {
    EvalError::new(format!("undeclared reference to `{name}`"))
}

#[cold]
pub fn no_such_field(field: &str) -> EvalError {
    EvalError::new(format!("no such field `{field}`"))
}

#[cold]
pub fn no_such_key(key: &str) -> EvalError {
    EvalError::new(format!("no such key `{key}`"))
}

#[cold]
pub fn no_such_function(name: &str) -> EvalError {
    EvalError::new(format!("unknown function `{name}`"))
}

#[cold]
pub fn no_such_overload(function: &str, operands: &[&str]) -> EvalError {
    EvalError::new(format!("no overload of `{function}` for ({})", operands.join(", ")))
}

#[cold]
pub fn cannot_access_field(type_name: &str, field: &str) -> EvalError {
    EvalError::new(format!("cannot access field `{field}` on value of type {type_name}"))
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new("division by zero")
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::new("modulo by zero")
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::new(format!("integer overflow in {operation}"))
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(format!("index {index} out of bounds for list of length {len}"))
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::new(format!("value of type {type_name} is not iterable"))
}

#[cold]
pub fn condition_not_bool(type_name: &str) -> EvalError {
    EvalError::new(format!("ternary condition must be bool, got {type_name}"))
}

#[cold]
pub fn map_key_not_string(type_name: &str) -> EvalError {
    EvalError::new(format!("map keys must be strings, got {type_name}"))
}
