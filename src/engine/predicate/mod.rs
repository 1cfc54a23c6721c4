pub mod builtins;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{DefinitionError, PredicateError};
use crate::engine::expr::{Arg, Expr, Invocation};

pub use registry::PredicateRegistry;

type CheckFn = dyn Fn(&Value, &[Value]) -> Result<bool, PredicateError> + Send + Sync;

/// Whether a predicate checks the shape of a value or a property of it.
///
/// Type-check failures are not reported when the presence gate of a rule
/// already failed (`is missing`, `must be filled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Type,
    Value,
}

/// Named boolean check over a value and zero or more bound arguments.
///
/// Cloning shares the underlying function, so one predicate can back any
/// number of rules and be used from several threads.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    kind: PredicateKind,
    arity: usize,
    check: Arc<CheckFn>,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, kind: PredicateKind, arity: usize, check: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            kind,
            arity,
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Runs the check. Never mutates `value`.
    pub fn call(&self, value: &Value, args: &[Value]) -> Result<bool, PredicateError> {
        if args.len() != self.arity {
            return Err(PredicateError::Arity {
                name: self.name().to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.check)(value, args)
    }

    /// Binds arguments, producing a leaf expression.
    pub fn bind(&self, args: Vec<Arg>) -> Result<Expr, DefinitionError> {
        if args.len() != self.arity {
            return Err(DefinitionError::Arity {
                name: self.name().to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        Ok(Expr::Leaf(Invocation::new(self.clone(), args)))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}
