use rulecheck::domain::error::EvaluationError;
use rulecheck::engine::dsl::{eql, gt, str_};
use rulecheck::engine::expr::Expr;
use rulecheck::engine::schema::{Schema, SchemaBuilder};
use serde_json::{Value, json};

#[derive(Clone, Copy)]
enum Macro {
    Value,
    Filled,
    Maybe,
}

fn schema(required: bool, gate: Macro, expr: Expr) -> Schema {
    let builder = Schema::builder();
    let rule = if required {
        builder.required("foo")
    } else {
        builder.optional("foo")
    };
    let builder: SchemaBuilder = match gate {
        Macro::Value => rule.value(expr),
        Macro::Filled => rule.filled(expr),
        Macro::Maybe => rule.maybe(expr),
    };
    builder.build().expect("schema")
}

fn predicates(required: bool, gate: Macro, input: Value) -> Vec<String> {
    schema(required, gate, str_() & eql(json!("ok")))
        .errors(&input)
        .expect("evaluates")
        .violations_at("foo")
        .iter()
        .map(|violation| violation.predicate.clone())
        .collect()
}

fn row(required: bool, gate: Macro) -> [Vec<String>; 4] {
    [
        predicates(required, gate, json!({})),
        predicates(required, gate, json!({"foo": null})),
        predicates(required, gate, json!({"foo": ""})),
        predicates(required, gate, json!({"foo": "ok"})),
    ]
}

fn expected(cells: [&[&str]; 4]) -> [Vec<String>; 4] {
    cells.map(|cell| cell.iter().map(|name| name.to_string()).collect())
}

#[test]
fn required_value() {
    assert_eq!(
        row(true, Macro::Value),
        expected([&["key?", "eql?"], &["str?", "eql?"], &["eql?"], &[]])
    );
}

#[test]
fn required_filled() {
    assert_eq!(
        row(true, Macro::Filled),
        expected([&["key?", "eql?"], &["filled?", "eql?"], &["filled?", "eql?"], &[]])
    );
}

#[test]
fn required_maybe() {
    assert_eq!(
        row(true, Macro::Maybe),
        expected([&["key?", "eql?"], &[], &["eql?"], &[]])
    );
}

#[test]
fn optional_value() {
    assert_eq!(
        row(false, Macro::Value),
        expected([&[], &["str?", "eql?"], &["eql?"], &[]])
    );
}

#[test]
fn optional_filled() {
    assert_eq!(
        row(false, Macro::Filled),
        expected([&[], &["filled?"], &["filled?"], &[]])
    );
}

#[test]
fn optional_maybe() {
    assert_eq!(
        row(false, Macro::Maybe),
        expected([&[], &[], &["eql?"], &[]])
    );
}

fn raises(required: bool, gate: Macro, input: Value) -> bool {
    matches!(
        schema(required, gate, gt(json!(0))).call(input),
        Err(EvaluationError::Predicate { .. })
    )
}

#[test]
fn ill_typed_values_raise_where_the_predicate_runs() {
    assert!(raises(true, Macro::Value, json!({})));
    assert!(raises(true, Macro::Value, json!({"foo": null})));
    assert!(raises(true, Macro::Filled, json!({"foo": ""})));
    assert!(raises(true, Macro::Maybe, json!({"foo": ""})));
    assert!(raises(false, Macro::Maybe, json!({"foo": ""})));
}

#[test]
fn skipped_predicates_never_raise() {
    assert!(!raises(false, Macro::Value, json!({})));
    assert!(!raises(false, Macro::Filled, json!({"foo": null})));
    assert!(!raises(false, Macro::Filled, json!({"foo": ""})));
    assert!(!raises(true, Macro::Maybe, json!({"foo": null})));
    assert!(!raises(false, Macro::Maybe, json!({"foo": null})));
}
