use serde::Serialize;
use serde_json::{Value, json};

use crate::engine::predicate::{PredicateKind, PredicateRegistry};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredicatesCommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

#[derive(Serialize)]
struct PredicateEntry<'a> {
    name: &'a str,
    kind: PredicateKind,
    arity: usize,
}

/// Lists the built-in predicates sorted by name.
pub fn run() -> PredicatesCommandResponse {
    let registry = PredicateRegistry::builtin();
    let entries: Vec<PredicateEntry<'_>> = registry
        .iter()
        .map(|predicate| PredicateEntry {
            name: predicate.name(),
            kind: predicate.kind(),
            arity: predicate.arity(),
        })
        .collect();
    match serde_json::to_value(&entries) {
        Ok(payload) => PredicatesCommandResponse {
            exit_code: 0,
            payload,
        },
        Err(err) => PredicatesCommandResponse {
            exit_code: 1,
            payload: json!({
                "error": "internal_error",
                "message": format!("failed to serialize predicate list: {err}"),
                "code": 1,
                "details": {"command": "predicates"},
            }),
        },
    }
}
