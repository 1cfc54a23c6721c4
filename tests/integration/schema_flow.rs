use rulecheck::domain::errors::ErrorEntry;
use rulecheck::engine::dsl::{attr, date, each, eql, gt, included_in, int, min_size, str_};
use rulecheck::engine::messages::{DefaultMessages, MessageResolver};
use rulecheck::engine::rule::Rule;
use rulecheck::engine::schema::Schema;
use serde_json::json;

fn messages(schema: &Schema, input: serde_json::Value, path: &str) -> Vec<String> {
    let resolver = DefaultMessages::new();
    schema
        .errors(&input)
        .expect("evaluates")
        .violations_at(path)
        .iter()
        .map(|violation| resolver.resolve(violation))
        .collect()
}

#[test]
fn required_number_must_equal_23() {
    let schema = Schema::builder()
        .required("number")
        .filled(int() & eql(json!(23)))
        .build()
        .expect("schema");

    assert_eq!(
        messages(&schema, json!({}), "number"),
        vec!["is missing", "must be equal to 23"]
    );
    assert!(schema.call(json!({"number": 23})).expect("call").success());
    assert_eq!(
        messages(&schema, json!({"number": 8}), "number"),
        vec!["must be equal to 23"]
    );
}

#[test]
fn nested_customer_address_city() {
    let schema = Schema::builder()
        .nested("customer", |customer| {
            customer
                .required("name")
                .filled(str_())
                .nested("address", |address| address.required("city").filled(str_()))
        })
        .build()
        .expect("schema");

    let errors = schema.errors(&json!({})).expect("evaluates");
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["customer"]);
    let customer = errors
        .get("customer")
        .and_then(ErrorEntry::as_nested)
        .expect("customer");
    assert_eq!(customer.keys().collect::<Vec<_>>(), vec!["name", "address"]);
    assert_eq!(errors.violations_at("customer.address.city").len(), 1);
    assert_eq!(
        messages(&schema, json!({}), "customer.address.city"),
        vec!["is missing"]
    );

    let valid = json!({"customer": {"name": "Ada", "address": {"city": "Rome"}}});
    assert!(schema.call(valid).expect("call").success());
}

#[test]
fn dotted_rules_and_nested_schemas_share_one_shape() {
    let dotted = Schema::builder()
        .required("customer.address.city")
        .filled(str_())
        .build()
        .expect("schema");
    let nested = Schema::builder()
        .nested("customer", |customer| {
            customer.nested("address", |address| address.required("city").filled(str_()))
        })
        .build()
        .expect("schema");

    let input = json!({"customer": {"address": {}}});
    assert_eq!(
        dotted.errors(&input).expect("evaluates"),
        nested.errors(&input).expect("evaluates")
    );
}

#[test]
fn cross_field_rule_is_skipped_when_a_dependency_is_invalid() {
    let schema = Schema::builder()
        .required("start_date")
        .filled(date())
        .required("end_date")
        .filled(date())
        .check(
            "end_after_start",
            &["start_date", "end_date"],
            gt(attr("start_date")).on("end_date"),
        )
        .build()
        .expect("schema");

    let errors = schema
        .errors(&json!({"start_date": "foo", "end_date": "2024-01-31"}))
        .expect("evaluates");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["start_date"]);

    let missing = schema.errors(&json!({"end_date": "2024-01-31"})).expect("evaluates");
    assert!(missing.get("end_after_start").is_none());
}

#[test]
fn errors_follow_declaration_order() {
    let schema = Schema::builder()
        .required("a")
        .filled(int())
        .required("b")
        .filled(int())
        .required("c")
        .filled(int())
        .build()
        .expect("schema");
    let errors = schema
        .errors(&json!({"c": "x", "b": "y", "a": "z"}))
        .expect("evaluates");
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn each_reports_element_paths() {
    let schema = Schema::builder()
        .required("tags")
        .value(min_size(json!(1)) & each(included_in(json!(["red", "blue"]))))
        .build()
        .expect("schema");

    let errors = schema
        .errors(&json!({"tags": ["red", "green", "blue", "pink"]}))
        .expect("evaluates");
    let paths: Vec<_> = errors
        .violations()
        .into_iter()
        .map(|violation| violation.path.as_str())
        .collect();
    assert_eq!(paths, vec!["tags.1", "tags.3"]);
}

#[test]
fn raw_rules_skip_presence_gating() {
    let schema = Schema::builder()
        .rule(Rule::new("nickname", str_() | rulecheck::engine::dsl::none()))
        .build()
        .expect("schema");
    assert!(schema.call(json!({})).expect("call").success());
    assert!(schema.call(json!({"nickname": 3})).expect("call").failure());
}

#[test]
fn output_passes_the_input_through() {
    let schema = Schema::builder()
        .optional("age")
        .maybe(int())
        .build()
        .expect("schema");
    let input = json!({"age": null, "unknown": {"nested": [1, {"x": true}]}});
    let result = schema.call(input.clone()).expect("call");
    assert!(result.success());
    assert_eq!(result.into_output(), input);
}

#[test]
fn repeated_calls_are_deterministic() {
    let schema = Schema::builder()
        .required("a")
        .filled(int() & gt(json!(3)))
        .nested("b", |b| b.required("c").is_filled())
        .build()
        .expect("schema");
    let input = json!({"a": 1});
    let first = serde_json::to_value(schema.errors(&input).expect("evaluates")).expect("json");
    for _ in 0..10 {
        let again = serde_json::to_value(schema.errors(&input).expect("evaluates")).expect("json");
        assert_eq!(again, first);
    }
}
