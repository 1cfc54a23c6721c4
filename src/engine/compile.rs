//! Compiles declarative schema documents into [`Schema`] values.
//!
//! Expression documents:
//!
//! | document                              | expression                     |
//! |---------------------------------------|--------------------------------|
//! | `"int?"`                              | zero-argument leaf             |
//! | `{"eql?": 23}`                        | one-argument leaf              |
//! | `{"size?": [2, 5]}`                   | one argument (the array)       |
//! | `{"ref": "start"}` as an argument     | attribute reference            |
//! | `{"subject": "end", "gt?": ...}`      | leaf retargeted to `end`       |
//! | `{"and": [..]}`, `{"or": [..]}`       | left fold of the list          |
//! | `{"xor": [a, b]}`, `{"then": [a, b]}` | binary combinator              |
//! | `{"not": e}`, `{"each": e}`           | unary combinator               |
//!
//! Arguments follow the predicate arity: a single-argument predicate takes the
//! whole value, wider predicates take an array of exactly that length.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::definition::{CheckDef, MemberDef, SchemaDocument};
use crate::domain::error::DefinitionError;
use crate::domain::path::AttrPath;
use crate::engine::expr::{Arg, Expr};
use crate::engine::predicate::{Predicate, PredicateRegistry};
use crate::engine::rule::{Gate, Requirement, Rule};
use crate::engine::schema::{Schema, SchemaBuilder};

const SUBJECT_KEY: &str = "subject";
const REF_KEY: &str = "ref";

pub fn compile(
    document: &SchemaDocument,
    registry: &PredicateRegistry,
) -> Result<Schema, DefinitionError> {
    let schema = level(
        Schema::builder(),
        &document.members,
        &document.checks,
        registry,
    )?
    .build()?;
    debug!(
        members = document.members.len(),
        checks = document.checks.len(),
        "compiled schema document"
    );
    Ok(schema)
}

/// Compiles one expression document.
pub fn compile_expr(raw: &Value, registry: &PredicateRegistry) -> Result<Expr, DefinitionError> {
    match raw {
        Value::String(name) => registry.get(name)?.bind(Vec::new()),
        Value::Object(map) => compile_object(map, registry),
        other => Err(invalid_expression(format!(
            "expected a predicate name or an object, got {other}"
        ))),
    }
}

fn level(
    mut builder: SchemaBuilder,
    members: &[MemberDef],
    checks: &[CheckDef],
    registry: &PredicateRegistry,
) -> Result<SchemaBuilder, DefinitionError> {
    for member in members {
        builder = compile_member(builder, member, registry)?;
    }
    for check in checks {
        let depends_on: Vec<&str> = check.depends_on.iter().map(String::as_str).collect();
        builder = builder.check(
            &check.name,
            &depends_on,
            compile_expr(&check.expr, registry)?,
        );
    }
    Ok(builder)
}

fn compile_member(
    builder: SchemaBuilder,
    member: &MemberDef,
    registry: &PredicateRegistry,
) -> Result<SchemaBuilder, DefinitionError> {
    let key = member.key().map(str::to_string);
    let invalid = |reason: &str| DefinitionError::InvalidMember {
        key: key.clone(),
        reason: reason.to_string(),
    };

    let targets = [&member.required, &member.optional, &member.schema]
        .into_iter()
        .filter(|target| target.is_some())
        .count();
    if targets != 1 {
        return Err(invalid(
            "exactly one of `required`, `optional` or `schema` must be set",
        ));
    }

    let gates = [&member.value, &member.filled, &member.maybe, &member.each];
    let gate_count = gates.iter().filter(|gate| gate.is_some()).count();

    if let Some(name) = &member.schema {
        if gate_count > 0 {
            return Err(invalid("a nested schema takes `members`, not a gate"));
        }
        let nested = level(
            Schema::builder(),
            &member.members,
            &member.checks,
            registry,
        )?
        .build()?;
        return Ok(builder.mount(name, nested));
    }

    if !member.members.is_empty() || !member.checks.is_empty() {
        return Err(invalid("`members` and `checks` need `schema`"));
    }
    if gate_count != 1 {
        return Err(invalid(
            "exactly one of `value`, `filled`, `maybe` or `each` must be set",
        ));
    }

    let (requirement, path) = match (&member.required, &member.optional) {
        (Some(path), _) => (Requirement::Required, path),
        (None, Some(path)) => (Requirement::Optional, path),
        (None, None) => return Err(invalid("missing attribute key")),
    };

    let (gate, expr) = if let Some(list) = &member.value {
        (Gate::Value, conjunction(list, registry)?)
    } else if let Some(list) = &member.filled {
        (Gate::Filled, conjunction(list, registry)?)
    } else if let Some(list) = &member.maybe {
        (Gate::Maybe, conjunction(list, registry)?)
    } else if let Some(list) = &member.each {
        let Some(inner) = conjunction(list, registry)? else {
            return Err(invalid("`each` needs at least one predicate"));
        };
        (Gate::Value, Some(inner.each()))
    } else {
        return Err(invalid("missing gate"));
    };

    Ok(builder.rule(Rule::gated(path, requirement, gate, expr)))
}

/// A predicate list in a rule is an implicit `and`.
fn conjunction(list: &[Value], registry: &PredicateRegistry) -> Result<Option<Expr>, DefinitionError> {
    let mut combined: Option<Expr> = None;
    for raw in list {
        let expr = compile_expr(raw, registry)?;
        combined = Some(match combined {
            Some(left) => left.and(expr),
            None => expr,
        });
    }
    Ok(combined)
}

fn compile_object(
    map: &Map<String, Value>,
    registry: &PredicateRegistry,
) -> Result<Expr, DefinitionError> {
    let subject = match map.get(SUBJECT_KEY) {
        None => None,
        Some(Value::String(path)) => Some(path.as_str()),
        Some(other) => {
            return Err(invalid_expression(format!(
                "`subject` must be an attribute path, got {other}"
            )));
        }
    };

    let mut operators = map.iter().filter(|(key, _)| key.as_str() != SUBJECT_KEY);
    let (Some((operator, argument)), None) = (operators.next(), operators.next()) else {
        return Err(invalid_expression(
            "an expression object holds exactly one operator besides `subject`",
        ));
    };

    let expr = match operator.as_str() {
        "and" | "or" => {
            let items = operands(operator, argument)?;
            let mut compiled = items.iter().map(|item| compile_expr(item, registry));
            let Some(first) = compiled.next() else {
                return Err(invalid_expression(format!("`{operator}` needs at least one operand")));
            };
            compiled.try_fold(first?, |left, right| {
                let right = right?;
                Ok::<_, DefinitionError>(if operator == "and" {
                    left.and(right)
                } else {
                    left.or(right)
                })
            })?
        }
        "xor" | "then" => {
            let [left, right] = operands(operator, argument)? else {
                return Err(invalid_expression(format!("`{operator}` takes exactly two operands")));
            };
            let left = compile_expr(left, registry)?;
            let right = compile_expr(right, registry)?;
            if operator == "xor" {
                left.xor(right)
            } else {
                left.then(right)
            }
        }
        "not" => compile_expr(argument, registry)?.negate(),
        "each" => compile_expr(argument, registry)?.each(),
        name => {
            let predicate = registry.get(name)?;
            predicate.bind(arguments(predicate, argument)?)?
        }
    };

    Ok(match subject {
        Some(path) => expr.on(path),
        None => expr,
    })
}

fn operands<'a>(operator: &str, argument: &'a Value) -> Result<&'a [Value], DefinitionError> {
    match argument {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(invalid_expression(format!(
            "`{operator}` takes an array of expressions, got {other}"
        ))),
    }
}

fn arguments(predicate: &Predicate, raw: &Value) -> Result<Vec<Arg>, DefinitionError> {
    let arity_error = |actual: usize| DefinitionError::Arity {
        name: predicate.name().to_string(),
        expected: predicate.arity(),
        actual,
    };
    match (predicate.arity(), raw) {
        (0, Value::Bool(true) | Value::Null) => Ok(Vec::new()),
        (0, Value::Array(items)) if items.is_empty() => Ok(Vec::new()),
        (0, _) => Err(arity_error(1)),
        (1, raw) => Ok(vec![argument(raw)]),
        (arity, Value::Array(items)) if items.len() == arity => {
            Ok(items.iter().map(argument).collect())
        }
        (_, Value::Array(items)) => Err(arity_error(items.len())),
        (_, _) => Err(arity_error(1)),
    }
}

fn argument(raw: &Value) -> Arg {
    match raw {
        Value::Object(map) if map.len() == 1 => match map.get(REF_KEY) {
            Some(Value::String(path)) => Arg::Attr(AttrPath::unchecked(path)),
            _ => Arg::Value(raw.clone()),
        },
        _ => Arg::Value(raw.clone()),
    }
}

fn invalid_expression(reason: impl Into<String>) -> DefinitionError {
    DefinitionError::InvalidExpression {
        reason: reason.into(),
    }
}
