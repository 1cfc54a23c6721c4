use serde_json::Value;
use tracing::trace;

use crate::domain::error::{DefinitionError, EvaluationError};
use crate::domain::path::{AttrPath, Presence};
use crate::domain::violation::Violation;
use crate::engine::expr::{Expr, Outcome, Raised, Scope};
use crate::engine::predicate::PredicateKind;

static NULL: Value = Value::Null;

pub const KEY_PREDICATE: &str = "key?";
pub const FILLED_PREDICATE: &str = "filled?";

/// Whether the key itself must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// Gate applied to a present value before its expression runs.
///
/// | gate   | missing (required) | missing (optional) | nil                       | blank                     |
/// |--------|--------------------|--------------------|---------------------------|---------------------------|
/// | value  | `key?` + expr      | skip               | expr                      | expr                      |
/// | filled | `key?` + expr      | skip               | `filled?` (+ expr if req) | `filled?` (+ expr if req) |
/// | maybe  | `key?` + expr      | skip               | skip                      | expr                      |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Value,
    Filled,
    Maybe,
}

/// Binds one attribute path to an expression.
#[derive(Debug, Clone)]
pub struct Rule {
    path: AttrPath,
    presence: Option<(Requirement, Gate)>,
    expr: Option<Expr>,
}

impl Rule {
    /// Rule without presence gating: the expression always runs, against `null` when the key is missing.
    pub fn new(path: &str, expr: Expr) -> Self {
        Self {
            path: AttrPath::unchecked(path),
            presence: None,
            expr: Some(expr),
        }
    }

    pub fn gated(path: &str, requirement: Requirement, gate: Gate, expr: Option<Expr>) -> Self {
        Self {
            path: AttrPath::unchecked(path),
            presence: Some((requirement, gate)),
            expr,
        }
    }

    pub fn path(&self) -> &AttrPath {
        &self.path
    }

    pub fn presence(&self) -> Option<(Requirement, Gate)> {
        self.presence
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        self.path.check()?;
        match &self.expr {
            Some(expr) => expr.validate(),
            None => Ok(()),
        }
    }

    /// Evaluates against a full input mapping. Paths in the returned
    /// violations are relative to `input`.
    pub fn call(&self, input: &Value) -> Result<Vec<Violation>, EvaluationError> {
        Ok(self
            .evaluate(input, &AttrPath::root())?
            .into_iter()
            .map(|(_, violation)| violation)
            .collect())
    }

    /// Returns `(key relative to input, violation)` pairs; violation paths are prefixed with `prefix`.
    pub(crate) fn evaluate(
        &self,
        input: &Value,
        prefix: &AttrPath,
    ) -> Result<Vec<(AttrPath, Violation)>, EvaluationError> {
        let value = self.path.lookup(input);
        trace!(path = %prefix.join(&self.path), presence = ?Presence::of(value), "evaluating rule");

        let Some((requirement, gate)) = self.presence else {
            return self.run(input, value.unwrap_or(&NULL), prefix, false);
        };

        let mut violations = Vec::new();
        let gate_failed = match (requirement, gate, Presence::of(value)) {
            (Requirement::Optional, _, Presence::Missing) => return Ok(violations),
            (Requirement::Required, _, Presence::Missing) => {
                violations.push(self.violation(
                    prefix,
                    &self.path,
                    KEY_PREDICATE,
                    Value::String(prefix.join(&self.path).to_string()),
                    Value::Null,
                ));
                true
            }
            (_, Gate::Maybe, Presence::Nil) => return Ok(violations),
            (requirement, Gate::Filled, Presence::Nil | Presence::Blank) => {
                violations.push(self.violation(
                    prefix,
                    &self.path,
                    FILLED_PREDICATE,
                    Value::Bool(true),
                    value.cloned().unwrap_or(Value::Null),
                ));
                if requirement == Requirement::Optional {
                    return Ok(violations);
                }
                true
            }
            _ => false,
        };

        violations.extend(self.run(input, value.unwrap_or(&NULL), prefix, gate_failed)?);
        Ok(violations)
    }

    fn run(
        &self,
        input: &Value,
        value: &Value,
        prefix: &AttrPath,
        gate_failed: bool,
    ) -> Result<Vec<(AttrPath, Violation)>, EvaluationError> {
        let Some(expr) = &self.expr else {
            return Ok(Vec::new());
        };
        let outcome = expr
            .eval(Scope::new(input, value))
            .map_err(|raised| self.raised(prefix, raised))?;
        Ok(violations_from(outcome, prefix, &self.path, gate_failed))
    }

    fn violation(
        &self,
        prefix: &AttrPath,
        key: &AttrPath,
        predicate: &str,
        expected: Value,
        actual: Value,
    ) -> (AttrPath, Violation) {
        (
            key.clone(),
            Violation::new(prefix.join(key).to_string(), predicate, expected, actual),
        )
    }

    fn raised(&self, prefix: &AttrPath, raised: Raised) -> EvaluationError {
        raise_at(&prefix.join(&self.path), raised)
    }
}

pub(crate) fn raise_at(path: &AttrPath, raised: Raised) -> EvaluationError {
    let path = raised
        .index
        .iter()
        .fold(path.clone(), |path, position| path.child(position.to_string()));
    EvaluationError::Predicate {
        path: path.to_string(),
        predicate: raised.predicate,
        source: raised.source,
    }
}

/// Turns the failed leaves of `outcome` into violations keyed under `key`.
///
/// When the presence gate already failed, type-check leaves are dropped:
/// `key?`/`filled?` describe the problem.
pub(crate) fn violations_from(
    outcome: Outcome,
    prefix: &AttrPath,
    key: &AttrPath,
    gate_failed: bool,
) -> Vec<(AttrPath, Violation)> {
    if outcome.passed {
        return Vec::new();
    }
    outcome
        .failures
        .into_iter()
        .filter(|hit| !(gate_failed && hit.kind == PredicateKind::Type))
        .map(|hit| {
            let key = hit
                .index
                .iter()
                .fold(key.clone(), |key, position| key.child(position.to_string()));
            let violation = Violation::new(
                prefix.join(&key).to_string(),
                hit.predicate,
                hit.expected,
                hit.actual,
            );
            (key, violation)
        })
        .collect()
}
