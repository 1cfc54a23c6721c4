use predicates::prelude::predicate;
use serde_json::Value;

#[test]
fn help_lists_subcommands() {
    assert_cmd::cargo::cargo_bin_cmd!("rulecheck")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("predicates"));
}

#[test]
fn version_is_available() {
    assert_cmd::cargo::cargo_bin_cmd!("rulecheck")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("rulecheck")
        .arg("frobnicate")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let error: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(error["error"], "input_usage_error");
    assert_eq!(error["code"], 3);
    assert_eq!(error["details"]["kind"], "cli_parse_error");
}

#[test]
fn predicates_lists_builtins() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("rulecheck")
        .arg("predicates")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));
    let listed: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    let names: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry["name"].as_str())
        .collect();
    assert!(names.contains(&"filled?"));
    assert!(names.contains(&"included_in?"));
    assert_eq!(names.len(), 30);
}
