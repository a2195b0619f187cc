//! Error types for the sequence engine and the micro-lambda evaluator.
//!
//! `LinqErrorKind` carries the structured category; the constructor
//! functions below are the public way to build errors so that message
//! wording lives in one place.

use std::fmt;

/// Result of any fallible engine operation.
pub type LinqResult<T> = Result<T, LinqError>;

/// Typed error category.
///
/// The first five variants are the engine's argument and cardinality
/// taxonomy; the rest are raised while evaluating callbacks.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinqErrorKind {
    // Argument validation (raised at the call that receives the argument)
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("argument `{name}` is out of range: {reason}")]
    OutOfRange { name: String, reason: String },
    #[error("invalid lambda expression at offset {offset}: {message}")]
    LambdaParse { message: String, offset: u32 },

    // Cardinality
    #[error("sequence contains no elements")]
    NoElements,
    #[error("sequence contains more than one matching element")]
    MoreThanOneElement,
    #[error("key not found: {key}")]
    KeyNotFound { key: String },
    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    // Evaluation
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("operator `{op}` cannot be applied to {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: &'static str },
    #[error("undefined variable: ${name}")]
    UndefinedVariable { name: String },
    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },
    #[error("no method `{method}` on {type_name}")]
    NoSuchMethod { method: String, type_name: String },
    #[error("no property `{property}` on {type_name}")]
    NoSuchProperty { property: String, type_name: String },
    #[error("cannot index into {type_name}")]
    NotIndexable { type_name: &'static str },
    #[error("{name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    // Boundaries
    #[error("invalid JSON: {message}")]
    Json { message: String },

    /// Raised by user callbacks that have no better category.
    #[error("{message}")]
    Custom { message: String },
}

/// Error raised by the engine or by a callback.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct LinqError {
    kind: Box<LinqErrorKind>,
}

impl LinqError {
    #[cold]
    pub fn new(kind: LinqErrorKind) -> Self {
        LinqError {
            kind: Box::new(kind),
        }
    }

    pub fn kind(&self) -> &LinqErrorKind {
        &self.kind
    }

    /// True for the "sequence contains no elements" condition.
    pub fn is_no_elements(&self) -> bool {
        matches!(*self.kind, LinqErrorKind::NoElements)
    }

    /// True for the `single` cardinality violation.
    pub fn is_more_than_one(&self) -> bool {
        matches!(*self.kind, LinqErrorKind::MoreThanOneElement)
    }

    /// True for invalid-argument failures, including lambda parse errors.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            *self.kind,
            LinqErrorKind::InvalidArgument { .. } | LinqErrorKind::LambdaParse { .. }
        )
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(*self.kind, LinqErrorKind::OutOfRange { .. })
    }

    /// Byte offset into the lambda source if this is a parse error.
    pub fn lambda_offset(&self) -> Option<u32> {
        match *self.kind {
            LinqErrorKind::LambdaParse { offset, .. } => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Debug for LinqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.kind, f)
    }
}

impl From<LinqErrorKind> for LinqError {
    fn from(kind: LinqErrorKind) -> Self {
        LinqError::new(kind)
    }
}

// Argument validation

#[cold]
pub fn invalid_argument(name: &str, reason: impl Into<String>) -> LinqError {
    LinqError::new(LinqErrorKind::InvalidArgument {
        name: name.to_string(),
        reason: reason.into(),
    })
}

#[cold]
pub fn out_of_range(name: &str, reason: impl Into<String>) -> LinqError {
    LinqError::new(LinqErrorKind::OutOfRange {
        name: name.to_string(),
        reason: reason.into(),
    })
}

#[cold]
pub fn lambda_parse_error(message: impl Into<String>, offset: u32) -> LinqError {
    LinqError::new(LinqErrorKind::LambdaParse {
        message: message.into(),
        offset,
    })
}

// Cardinality

#[cold]
pub fn no_elements() -> LinqError {
    LinqError::new(LinqErrorKind::NoElements)
}

#[cold]
pub fn more_than_one_element() -> LinqError {
    LinqError::new(LinqErrorKind::MoreThanOneElement)
}

#[cold]
pub fn key_not_found(key: &crate::Value) -> LinqError {
    LinqError::new(LinqErrorKind::KeyNotFound {
        key: format!("{key:?}"),
    })
}

#[cold]
pub fn duplicate_key(key: &crate::Value) -> LinqError {
    LinqError::new(LinqErrorKind::DuplicateKey {
        key: format!("{key:?}"),
    })
}

// Evaluation

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> LinqError {
    LinqError::new(LinqErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn invalid_operands(op: &'static str, left: &'static str, right: &'static str) -> LinqError {
    LinqError::new(LinqErrorKind::InvalidOperands { op, left, right })
}

#[cold]
pub fn division_by_zero() -> LinqError {
    LinqError::new(LinqErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &'static str) -> LinqError {
    LinqError::new(LinqErrorKind::IntegerOverflow { operation })
}

#[cold]
pub fn undefined_variable(name: &str) -> LinqError {
    LinqError::new(LinqErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_function(name: &str) -> LinqError {
    LinqError::new(LinqErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn no_such_method(method: &str, type_name: &str) -> LinqError {
    LinqError::new(LinqErrorKind::NoSuchMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn no_such_property(property: &str, type_name: &str) -> LinqError {
    LinqError::new(LinqErrorKind::NoSuchProperty {
        property: property.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn not_indexable(type_name: &'static str) -> LinqError {
    LinqError::new(LinqErrorKind::NotIndexable { type_name })
}

#[cold]
pub fn arity_mismatch(name: &str, expected: impl Into<String>, got: usize) -> LinqError {
    LinqError::new(LinqErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: expected.into(),
        got,
    })
}

// Boundaries

#[cold]
pub fn json_error(message: impl fmt::Display) -> LinqError {
    LinqError::new(LinqErrorKind::Json {
        message: message.to_string(),
    })
}

#[cold]
pub fn custom_error(message: impl Into<String>) -> LinqError {
    LinqError::new(LinqErrorKind::Custom {
        message: message.into(),
    })
}
