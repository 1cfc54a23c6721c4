use std::fs::File;

use rulecheck::domain::definition::SchemaDocument;
use rulecheck::domain::error::DefinitionError;
use rulecheck::engine::compile::compile;
use rulecheck::engine::messages::{DefaultMessages, render_messages};
use rulecheck::engine::predicate::{PredicateKind, PredicateRegistry};
use rulecheck::io::{self, Format};
use serde_json::json;
use tempfile::tempdir;

const SIGNUP_YAML: &str = r#"
members:
  - required: email
    filled:
      - str?
      - format?: "^[^@]+@[^@]+$"
  - required: age
    filled:
      - int?
      - gteq?: 18
  - optional: nickname
    maybe:
      - str?
      - size?: [2, 12]
  - schema: address
    members:
      - required: city
        filled: [str?]
      - optional: zip
        value:
          - or: [str?, int?]
checks:
  - name: password_confirmation
    depends_on: [password, confirmation]
    expr:
      subject: confirmation
      eql?: {ref: password}
"#;

fn load(source: &str, file_name: &str) -> SchemaDocument {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(file_name);
    std::fs::write(&path, source).expect("write schema");
    let format = io::resolve_format(None, Some(&path), "schema").expect("format");
    let raw = io::reader::read_document(File::open(&path).expect("open"), format).expect("read");
    serde_json::from_value(raw).expect("document")
}

#[test]
fn yaml_schema_validates_and_renders_messages() {
    let schema = compile(&load(SIGNUP_YAML, "signup.yaml"), &PredicateRegistry::builtin())
        .expect("schema");

    let input = json!({
        "email": "ada",
        "age": 17,
        "nickname": null,
        "address": {"zip": true},
        "password": "secret",
        "confirmation": "Secret"
    });
    let result = schema.call(input.clone()).expect("call");
    assert!(result.failure());
    assert_eq!(result.output(), &input);
    assert_eq!(
        render_messages(result.errors(), &DefaultMessages::new()),
        json!({
            "email": ["is in invalid format"],
            "age": ["must be greater than or equal to 18"],
            "address": {
                "city": ["is missing"],
                "zip": ["must be a string", "must be an integer"]
            },
            "password_confirmation": ["must be equal to secret"]
        })
    );
}

#[test]
fn yaml_schema_accepts_valid_input() {
    let schema = compile(&load(SIGNUP_YAML, "signup.yml"), &PredicateRegistry::builtin())
        .expect("schema");
    let input = json!({
        "email": "ada@example.com",
        "age": 36,
        "nickname": "ada",
        "address": {"city": "London", "zip": "N1"},
        "password": "secret",
        "confirmation": "secret"
    });
    assert!(schema.call(input).expect("call").success());
}

#[test]
fn json_and_yaml_documents_compile_alike() {
    let yaml = load(SIGNUP_YAML, "signup.yaml");
    let json_source = serde_json::to_string(&yaml).expect("serialize");
    let json = load(&json_source, "signup.json");
    assert_eq!(yaml, json);
}

#[test]
fn custom_predicates_resolve_by_name() {
    let mut registry = PredicateRegistry::builtin();
    registry
        .register("uppercase?", PredicateKind::Value, 0, |value, _| {
            Ok(value
                .as_str()
                .is_some_and(|text| text.chars().all(|c| !c.is_lowercase())))
        })
        .expect("register");

    let document: SchemaDocument = serde_json::from_value(json!({
        "members": [{"required": "code", "filled": ["str?", "uppercase?"]}]
    }))
    .expect("document");
    let schema = compile(&document, &registry).expect("schema");
    assert!(schema.call(json!({"code": "ABC"})).expect("call").success());
    let errors = schema.errors(&json!({"code": "abc"})).expect("evaluates");
    assert_eq!(errors.violations_at("code")[0].predicate, "uppercase?");

    let unknown = compile(&document, &PredicateRegistry::builtin());
    assert!(matches!(
        unknown,
        Err(DefinitionError::UnknownPredicate { name }) if name == "uppercase?"
    ));
}

#[test]
fn explicit_format_overrides_the_extension() {
    let format = io::resolve_format(Some(Format::Yaml), Some("input.txt".as_ref()), "input");
    assert_eq!(format.expect("format"), Format::Yaml);
}
