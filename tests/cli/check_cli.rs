use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::predicate;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

const SCHEMA: &str = r#"{
    "members": [
        {"required": "number", "filled": ["int?", {"eql?": 23}]},
        {"schema": "customer", "members": [{"required": "name", "filled": ["str?"]}]}
    ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn check(schema: &Path) -> assert_cmd::Command {
    let mut command = assert_cmd::cargo::cargo_bin_cmd!("rulecheck");
    command.arg("check").arg("--schema").arg(schema);
    command
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

#[test]
fn valid_input_exits_zero() {
    let dir = tempdir().expect("tempdir");
    let schema = write(&dir, "schema.json", SCHEMA);
    check(&schema)
        .write_stdin(r#"{"number": 23, "customer": {"name": "Ada"}}"#)
        .assert()
        .code(0)
        .stdout(predicate::str::contains(r#"{"success":true,"errors":{}}"#))
        .stderr(predicate::str::is_empty());
}

#[test]
fn violations_exit_two_with_nested_errors() {
    let dir = tempdir().expect("tempdir");
    let schema = write(&dir, "schema.json", SCHEMA);
    let output = check(&schema)
        .arg("--messages")
        .write_stdin("{}")
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(2));
    let payload = stdout_json(&output);
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["errors"]["number"][1]["predicate"], json!("eql?"));
    assert_eq!(payload["errors"]["customer"]["name"][0]["path"], json!("customer.name"));
    assert_eq!(
        payload["messages"],
        json!({
            "number": ["is missing", "must be equal to 23"],
            "customer": {"name": ["is missing"]}
        })
    );
}

#[test]
fn reads_yaml_input_files() {
    let dir = tempdir().expect("tempdir");
    let schema = write(&dir, "schema.json", SCHEMA);
    let input = write(&dir, "input.yaml", "number: 8\ncustomer:\n  name: Ada\n");
    let output = check(&schema).arg("--input").arg(&input).output().expect("run");

    assert_eq!(output.status.code(), Some(2));
    let payload = stdout_json(&output);
    assert_eq!(payload["errors"]["number"][0]["actual"], json!(8));
    assert!(payload.get("messages").is_none());
}

#[test]
fn yaml_stdin_needs_from() {
    let dir = tempdir().expect("tempdir");
    let schema = write(&dir, "schema.json", SCHEMA);
    check(&schema)
        .args(["--from", "yaml"])
        .write_stdin("number: 23\ncustomer:\n  name: Ada\n")
        .assert()
        .code(0);
}

#[test]
fn unknown_input_formats_are_rejected_by_the_parser() {
    let dir = tempdir().expect("tempdir");
    let schema = write(&dir, "schema.json", SCHEMA);
    let output = check(&schema)
        .args(["--from", "csv"])
        .write_stdin("number,23\n")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], json!("input_usage_error"));
    assert_eq!(error["details"]["kind"], json!("cli_parse_error"));
}

#[test]
fn invalid_schema_documents_exit_three() {
    let dir = tempdir().expect("tempdir");
    let schema = write(
        &dir,
        "schema.json",
        r#"{"members": [{"required": "number", "filled": ["nope?"]}]}"#,
    );
    let output = check(&schema).write_stdin("{}").output().expect("run");

    assert_eq!(output.status.code(), Some(3));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], json!("input_usage_error"));
    assert_eq!(error["details"]["kind"], json!("schema_definition"));
    assert!(error["message"].as_str().expect("message").contains("nope?"));
}

#[test]
fn predicate_type_errors_exit_three() {
    let dir = tempdir().expect("tempdir");
    let schema = write(
        &dir,
        "schema.yaml",
        "members:\n  - required: age\n    value: [{gt?: 18}]\n",
    );
    let output = check(&schema).write_stdin(r#"{"age": "old"}"#).output().expect("run");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["details"]["kind"], json!("predicate_type_error"));
    assert_eq!(error["details"]["predicate"], json!("gt?"));
}

#[test]
fn missing_schema_file_exits_three() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("absent.json");
    check(&missing)
        .write_stdin("{}")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("failed to open schema file"));
}
