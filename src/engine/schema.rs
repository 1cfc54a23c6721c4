//! Schema tree: ordered rules, nested schemas and cross-field checks.
//!
//! A schema is assembled with [`SchemaBuilder`] and frozen by
//! [`SchemaBuilder::build`]; a built [`Schema`] is immutable, `Send` and
//! `Sync`, so one instance can serve concurrent `call`s.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::domain::error::{DefinitionError, EvaluationError};
use crate::domain::errors::ErrorSet;
use crate::domain::path::{AttrPath, Presence};
use crate::domain::result::ValidationResult;
use crate::domain::violation::Violation;
use crate::engine::expr::{Expr, Scope};
use crate::engine::rule::{Gate, Requirement, Rule, raise_at, violations_from};

/// Predicate recorded when a nested schema receives something other than a mapping.
pub const HASH_PREDICATE: &str = "hash?";

#[derive(Debug, Clone)]
pub enum Member {
    Rule(Rule),
    Schema(Schema),
}

/// Named rule over several attributes of one level, run after its members.
#[derive(Debug, Clone)]
pub struct Check {
    name: AttrPath,
    depends_on: Vec<AttrPath>,
    expr: Expr,
}

impl Check {
    pub fn new(name: &str, depends_on: &[&str], expr: Expr) -> Self {
        Self {
            name: AttrPath::unchecked(name),
            depends_on: depends_on
                .iter()
                .map(|path| AttrPath::unchecked(path))
                .collect(),
            expr,
        }
    }

    pub fn name(&self) -> &AttrPath {
        &self.name
    }

    pub fn depends_on(&self) -> &[AttrPath] {
        &self.depends_on
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        self.name.check()?;
        for dependency in &self.depends_on {
            dependency.check()?;
        }
        self.expr.validate()
    }

    /// Dependencies must be present, non-null and free of violations from this call.
    fn ready(&self, input: &Value, errors: &ErrorSet) -> bool {
        self.depends_on.iter().all(|dependency| {
            !matches!(
                Presence::of(dependency.lookup(input)),
                Presence::Missing | Presence::Nil
            ) && !errors.contains(dependency)
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: Option<AttrPath>,
    members: Vec<Member>,
    checks: Vec<Check>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// `None` for a root schema, the mount key for a nested one.
    pub fn name(&self) -> Option<&AttrPath> {
        self.name.as_ref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Validates `input` and hands it back untouched as the result output.
    pub fn call(&self, input: Value) -> Result<ValidationResult, EvaluationError> {
        let errors = self.errors(&input)?;
        debug!(
            success = errors.is_empty(),
            violations = errors.len(),
            "schema evaluated"
        );
        Ok(ValidationResult::new(errors, input))
    }

    /// Validates `input` by reference, returning only the errors.
    pub fn errors(&self, input: &Value) -> Result<ErrorSet, EvaluationError> {
        self.evaluate(input, &AttrPath::root())
    }

    fn evaluate(&self, input: &Value, prefix: &AttrPath) -> Result<ErrorSet, EvaluationError> {
        let mut errors = ErrorSet::new();
        for member in &self.members {
            match member {
                Member::Rule(rule) => {
                    for (key, violation) in rule.evaluate(input, prefix)? {
                        errors.push(&key, violation);
                    }
                }
                Member::Schema(schema) => schema.evaluate_nested(input, prefix, &mut errors)?,
            }
        }

        for check in &self.checks {
            if !check.ready(input, &errors) {
                debug!(check = %prefix.join(&check.name), "skipping cross-field check");
                continue;
            }
            trace!(check = %prefix.join(&check.name), "evaluating cross-field check");
            let outcome = check
                .expr
                .eval(Scope::new(input, input))
                .map_err(|raised| raise_at(&prefix.join(&check.name), raised))?;
            for (key, violation) in violations_from(outcome, prefix, &check.name, false) {
                errors.push(&key, violation);
            }
        }
        Ok(errors)
    }

    fn evaluate_nested(
        &self,
        input: &Value,
        prefix: &AttrPath,
        errors: &mut ErrorSet,
    ) -> Result<(), EvaluationError> {
        let key = self.name.clone().unwrap_or_else(AttrPath::root);
        let nested_prefix = prefix.join(&key);
        let nested = match key.lookup(input) {
            None | Some(Value::Null) => {
                self.evaluate(&Value::Object(Map::new()), &nested_prefix)?
            }
            Some(value @ Value::Object(_)) => self.evaluate(value, &nested_prefix)?,
            Some(other) => {
                errors.push(
                    &key,
                    Violation::new(
                        nested_prefix.to_string(),
                        HASH_PREDICATE,
                        Value::Bool(true),
                        other.clone(),
                    ),
                );
                return Ok(());
            }
        };
        errors.merge_at(&key, nested);
        Ok(())
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if let Some(name) = &self.name {
            name.check()?;
        }
        for member in &self.members {
            match member {
                Member::Rule(rule) => rule.validate()?,
                Member::Schema(schema) => {
                    if schema.name.is_none() {
                        return Err(DefinitionError::InvalidMember {
                            key: None,
                            reason: "nested schema has no name".to_string(),
                        });
                    }
                    schema.validate()?;
                }
            }
        }
        self.checks.iter().try_for_each(Check::validate)
    }
}

/// Incremental schema construction; consumed by [`SchemaBuilder::build`].
///
/// ```
/// use rulecheck::engine::dsl::{eql, int, str_};
/// use rulecheck::engine::schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::builder()
///     .required("number").filled(int() & eql(json!(23)))
///     .nested("customer", |customer| customer.required("name").filled(str_()))
///     .build()
///     .expect("valid schema");
///
/// let result = schema.call(json!({"number": 23, "customer": {"name": "Ada"}})).unwrap();
/// assert!(result.success());
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct SchemaBuilder {
    name: Option<AttrPath>,
    members: Vec<Member>,
    checks: Vec<Check>,
}

impl SchemaBuilder {
    pub fn required(self, key: &str) -> RuleBuilder {
        RuleBuilder::new(self, key, Requirement::Required)
    }

    pub fn optional(self, key: &str) -> RuleBuilder {
        RuleBuilder::new(self, key, Requirement::Optional)
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.members.push(Member::Rule(rule));
        self
    }

    /// Mounts a nested schema under `key`, built by `define`.
    pub fn nested(mut self, key: &str, define: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> Self {
        let nested = define(SchemaBuilder {
            name: Some(AttrPath::unchecked(key)),
            ..SchemaBuilder::default()
        });
        self.members.push(Member::Schema(nested.into_schema()));
        self
    }

    /// Mounts an already built schema under `key`.
    pub fn mount(mut self, key: &str, schema: Schema) -> Self {
        self.members.push(Member::Schema(Schema {
            name: Some(AttrPath::unchecked(key)),
            ..schema
        }));
        self
    }

    pub fn check(mut self, name: &str, depends_on: &[&str], expr: Expr) -> Self {
        self.checks.push(Check::new(name, depends_on, expr));
        self
    }

    pub fn build(self) -> Result<Schema, DefinitionError> {
        let schema = self.into_schema();
        schema.validate()?;
        Ok(schema)
    }

    fn into_schema(self) -> Schema {
        Schema {
            name: self.name,
            members: self.members,
            checks: self.checks,
        }
    }
}

/// Pending `required(key)` / `optional(key)` awaiting its gate.
#[derive(Debug)]
#[must_use]
pub struct RuleBuilder {
    schema: SchemaBuilder,
    key: String,
    requirement: Requirement,
}

impl RuleBuilder {
    fn new(schema: SchemaBuilder, key: &str, requirement: Requirement) -> Self {
        Self {
            schema,
            key: key.to_string(),
            requirement,
        }
    }

    pub fn value(self, expr: Expr) -> SchemaBuilder {
        self.finish(Gate::Value, Some(expr))
    }

    pub fn filled(self, expr: Expr) -> SchemaBuilder {
        self.finish(Gate::Filled, Some(expr))
    }

    pub fn maybe(self, expr: Expr) -> SchemaBuilder {
        self.finish(Gate::Maybe, Some(expr))
    }

    /// Presence and filled gates only, no predicate.
    pub fn is_filled(self) -> SchemaBuilder {
        self.finish(Gate::Filled, None)
    }

    /// Applies `expr` to every element; a non-array value fails `array?`.
    pub fn each(self, expr: Expr) -> SchemaBuilder {
        self.value(expr.each())
    }

    fn finish(self, gate: Gate, expr: Option<Expr>) -> SchemaBuilder {
        let rule = Rule::gated(&self.key, self.requirement, gate, expr);
        self.schema.rule(rule)
    }
}

/// Host types that own a schema and validate through it.
pub trait Validate {
    fn schema(&self) -> &Schema;

    fn validate(&self, input: Value) -> Result<ValidationResult, EvaluationError> {
        self.schema().call(input)
    }
}

impl Validate for Schema {
    fn schema(&self) -> &Schema {
        self
    }
}
