use thiserror::Error;

use crate::domain::path::AttrPathError;

/// Raised by a predicate handed a value or argument it structurally cannot handle.
///
/// This signals a schema definition bug and is never reported as a violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PredicateError {
    /// Ordering comparison between values of incompatible types.
    #[error("cannot compare {actual} with {expected}")]
    Incomparable {
        actual: &'static str,
        expected: &'static str,
    },

    /// Value or argument shape the predicate does not support.
    #[error("{0}")]
    Unsupported(String),

    /// Called with a different number of arguments than it declares.
    #[error("predicate `{name}` takes {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors produced while building a schema.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error(transparent)]
    InvalidPath(#[from] AttrPathError),

    #[error("unknown predicate `{name}`")]
    UnknownPredicate { name: String },

    #[error("predicate `{name}` is already registered")]
    DuplicatePredicate { name: String },

    #[error("predicate `{name}` takes {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid expression: {reason}")]
    InvalidExpression { reason: String },

    #[error("invalid schema member{}: {reason}", at_key(.key))]
    InvalidMember { key: Option<String>, reason: String },
}

fn at_key(key: &Option<String>) -> String {
    key.as_deref()
        .map(|key| format!(" `{key}`"))
        .unwrap_or_default()
}

/// Fatal error surfaced from `Schema::call`; the schema or its input guard needs fixing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("predicate `{predicate}` raised on `{path}`: {source}")]
    Predicate {
        path: String,
        predicate: String,
        #[source]
        source: PredicateError,
    },
}
