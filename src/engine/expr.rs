//! Composite predicate expressions.
//!
//! Both sides of every binary combinator are evaluated so that all violated
//! leaves are reported, not only the first one. Whether a failure surfaces
//! depends on the combined boolean: a passing `or` reports nothing even when
//! one branch failed internally.

use std::ops::{BitAnd, BitOr, BitXor, Not};

use serde_json::Value;

use crate::domain::error::{DefinitionError, PredicateError};
use crate::domain::path::AttrPath;
use crate::domain::violation::expected_from_args;
use crate::engine::predicate::{Predicate, PredicateKind, builtins};

static NULL: Value = Value::Null;

/// Argument bound to a predicate invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    /// Another attribute of the same input level, read at evaluation time.
    Attr(AttrPath),
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// A predicate together with its bound arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    predicate: Predicate,
    args: Vec<Arg>,
    /// Attribute tested instead of the rule's own value.
    subject: Option<AttrPath>,
}

impl Invocation {
    pub fn new(predicate: Predicate, args: Vec<Arg>) -> Self {
        Self {
            predicate,
            args,
            subject: None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn subject(&self) -> Option<&AttrPath> {
        self.subject.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Leaf(Invocation),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// `a.then(b)`: `b` runs only when `a` holds; otherwise vacuously true.
    Implies(Box<Expr>, Box<Expr>),
    /// Applies the inner expression to every element of an array.
    Each(Box<Expr>),
}

/// One leaf outcome, either a failure or a satisfied check.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub predicate: String,
    pub kind: PredicateKind,
    pub expected: Value,
    pub actual: Value,
    /// Element indexes below the rule path, outermost `each` first.
    pub index: Vec<usize>,
}

impl Hit {
    fn prefixed(mut self, position: usize) -> Self {
        self.index.insert(0, position);
        self
    }
}

/// Combined boolean plus the leaves that explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub passed: bool,
    /// Leaves responsible for a failed outcome.
    pub failures: Vec<Hit>,
    /// Leaves that support a passing outcome: leaves that held, plus the
    /// failed leaves that made a `not` or a vacuous `then` pass. `not`
    /// reports these when it fails.
    pub satisfied: Vec<Hit>,
}

impl Outcome {
    fn leaf(passed: bool, hit: Hit) -> Self {
        if passed {
            Self {
                passed,
                failures: Vec::new(),
                satisfied: vec![hit],
            }
        } else {
            Self {
                passed,
                failures: vec![hit],
                satisfied: Vec::new(),
            }
        }
    }

    fn concat(passed: bool, left: Outcome, right: Outcome) -> Self {
        let mut failures = left.failures;
        failures.extend(right.failures);
        let mut satisfied = left.satisfied;
        satisfied.extend(right.satisfied);
        Self {
            passed,
            failures: if passed { Vec::new() } else { failures },
            satisfied,
        }
    }
}

/// Predicate raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Raised {
    pub predicate: String,
    pub index: Vec<usize>,
    pub source: PredicateError,
}

/// Values visible to an expression: the mapping of the current schema level
/// and the value under test.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub level: &'a Value,
    pub current: &'a Value,
}

impl<'a> Scope<'a> {
    pub fn new(level: &'a Value, current: &'a Value) -> Self {
        Self { level, current }
    }

    fn with_current(self, current: &'a Value) -> Self {
        Self {
            level: self.level,
            current,
        }
    }

    fn resolve(&self, path: &AttrPath) -> &'a Value {
        path.lookup(self.level).unwrap_or(&NULL)
    }
}

impl Expr {
    pub fn and(self, other: Expr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: Expr) -> Self {
        Self::Xor(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn then(self, consequence: Expr) -> Self {
        Self::Implies(Box::new(self), Box::new(consequence))
    }

    pub fn each(self) -> Self {
        Self::Each(Box::new(self))
    }

    /// Retargets every leaf without an explicit subject to the attribute at `path`.
    pub fn on(self, path: &str) -> Self {
        self.retarget(&AttrPath::unchecked(path))
    }

    fn retarget(self, path: &AttrPath) -> Self {
        match self {
            Self::Leaf(mut invocation) => {
                if invocation.subject.is_none() {
                    invocation.subject = Some(path.clone());
                }
                Self::Leaf(invocation)
            }
            Self::And(left, right) => left.retarget(path).and(right.retarget(path)),
            Self::Or(left, right) => left.retarget(path).or(right.retarget(path)),
            Self::Xor(left, right) => left.retarget(path).xor(right.retarget(path)),
            Self::Not(inner) => inner.retarget(path).negate(),
            Self::Implies(left, right) => left.retarget(path).then(right.retarget(path)),
            Self::Each(inner) => inner.retarget(path).each(),
        }
    }

    /// Checks arities and referenced paths of every leaf.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        match self {
            Self::Leaf(invocation) => {
                let predicate = &invocation.predicate;
                if invocation.args.len() != predicate.arity() {
                    return Err(DefinitionError::Arity {
                        name: predicate.name().to_string(),
                        expected: predicate.arity(),
                        actual: invocation.args.len(),
                    });
                }
                for path in self.referenced_paths() {
                    path.check()?;
                }
                Ok(())
            }
            Self::And(left, right)
            | Self::Or(left, right)
            | Self::Xor(left, right)
            | Self::Implies(left, right) => {
                left.validate()?;
                right.validate()
            }
            Self::Not(inner) | Self::Each(inner) => inner.validate(),
        }
    }

    /// Every attribute path referenced as a subject or an argument.
    pub fn referenced_paths(&self) -> Vec<&AttrPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a AttrPath>) {
        match self {
            Self::Leaf(invocation) => {
                out.extend(invocation.subject.iter());
                out.extend(invocation.args.iter().filter_map(|arg| match arg {
                    Arg::Attr(path) => Some(path),
                    Arg::Value(_) => None,
                }));
            }
            Self::And(left, right)
            | Self::Or(left, right)
            | Self::Xor(left, right)
            | Self::Implies(left, right) => {
                left.collect_paths(out);
                right.collect_paths(out);
            }
            Self::Not(inner) | Self::Each(inner) => inner.collect_paths(out),
        }
    }

    pub fn eval(&self, scope: Scope<'_>) -> Result<Outcome, Raised> {
        match self {
            Self::Leaf(invocation) => eval_leaf(invocation, scope),
            Self::And(left, right) => {
                let left = left.eval(scope)?;
                let right = right.eval(scope)?;
                Ok(Outcome::concat(left.passed && right.passed, left, right))
            }
            Self::Or(left, right) => {
                let left = left.eval(scope)?;
                let right = right.eval(scope)?;
                Ok(Outcome::concat(left.passed || right.passed, left, right))
            }
            Self::Xor(left, right) => {
                let left = left.eval(scope)?;
                let right = right.eval(scope)?;
                Ok(match (left.passed, right.passed) {
                    (true, false) | (false, true) => {
                        let winner = if left.passed { left } else { right };
                        Outcome {
                            passed: true,
                            failures: Vec::new(),
                            satisfied: winner.satisfied,
                        }
                    }
                    (true, true) => {
                        let mut failures = left.satisfied;
                        failures.extend(right.satisfied);
                        Outcome {
                            passed: false,
                            failures,
                            satisfied: Vec::new(),
                        }
                    }
                    (false, false) => Outcome::concat(false, left, right),
                })
            }
            Self::Not(inner) => {
                let inner = inner.eval(scope)?;
                Ok(Outcome {
                    passed: !inner.passed,
                    failures: if inner.passed {
                        inner.satisfied
                    } else {
                        Vec::new()
                    },
                    satisfied: inner.failures,
                })
            }
            Self::Implies(condition, consequence) => {
                let condition = condition.eval(scope)?;
                if !condition.passed {
                    return Ok(Outcome {
                        passed: true,
                        failures: Vec::new(),
                        satisfied: condition.failures,
                    });
                }
                consequence.eval(scope)
            }
            Self::Each(inner) => eval_each(inner, scope),
        }
    }
}

fn eval_leaf(invocation: &Invocation, scope: Scope<'_>) -> Result<Outcome, Raised> {
    let actual = match &invocation.subject {
        Some(path) => scope.resolve(path),
        None => scope.current,
    };
    let args: Vec<Value> = invocation
        .args
        .iter()
        .map(|arg| match arg {
            Arg::Value(value) => value.clone(),
            Arg::Attr(path) => scope.resolve(path).clone(),
        })
        .collect();

    let predicate = &invocation.predicate;
    let passed = predicate.call(actual, &args).map_err(|source| Raised {
        predicate: predicate.name().to_string(),
        index: Vec::new(),
        source,
    })?;

    Ok(Outcome::leaf(
        passed,
        Hit {
            predicate: predicate.name().to_string(),
            kind: predicate.kind(),
            expected: expected_from_args(&args),
            actual: actual.clone(),
            index: Vec::new(),
        },
    ))
}

fn eval_each(inner: &Expr, scope: Scope<'_>) -> Result<Outcome, Raised> {
    let array = builtins::array();
    let collection_hit = Hit {
        predicate: array.name().to_string(),
        kind: array.kind(),
        expected: Value::Bool(true),
        actual: scope.current.clone(),
        index: Vec::new(),
    };
    let Value::Array(items) = scope.current else {
        return Ok(Outcome::leaf(false, collection_hit));
    };

    let mut outcome = Outcome::leaf(true, collection_hit);
    for (position, item) in items.iter().enumerate() {
        let element = inner.eval(scope.with_current(item)).map_err(|mut raised| {
            raised.index.insert(0, position);
            raised
        })?;
        outcome.passed &= element.passed;
        outcome
            .failures
            .extend(element.failures.into_iter().map(|hit| hit.prefixed(position)));
        outcome
            .satisfied
            .extend(element.satisfied.into_iter().map(|hit| hit.prefixed(position)));
    }
    Ok(outcome)
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

impl BitXor for Expr {
    type Output = Expr;

    fn bitxor(self, rhs: Expr) -> Expr {
        self.xor(rhs)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.negate()
    }
}
