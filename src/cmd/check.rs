use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::definition::SchemaDocument;
use crate::domain::error::{DefinitionError, EvaluationError};
use crate::engine::compile::compile;
use crate::engine::messages::{DefaultMessages, render_messages};
use crate::engine::predicate::PredicateRegistry;
use crate::engine::schema::Schema;
use crate::io::{self, Format, IoError};

/// Input arguments for check command execution API.
#[derive(Debug, Clone)]
pub struct CheckCommandArgs {
    pub schema: PathBuf,
    pub input: Option<PathBuf>,
    pub from: Option<Format>,
    pub messages: bool,
}

/// Structured command response that carries exit-code mapping and JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckCommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

pub fn run_with_stdin<R: Read>(args: &CheckCommandArgs, stdin: R) -> CheckCommandResponse {
    match execute(args, stdin) {
        Ok((success, payload)) => CheckCommandResponse {
            exit_code: if success { 0 } else { 2 },
            payload,
        },
        Err(CommandError::InputUsage { message, details }) => CheckCommandResponse {
            exit_code: 3,
            payload: json!({
                "error": "input_usage_error",
                "message": message,
                "code": 3,
                "details": details,
            }),
        },
        Err(CommandError::Internal(message)) => CheckCommandResponse {
            exit_code: 1,
            payload: json!({
                "error": "internal_error",
                "message": message,
                "code": 1,
                "details": {"command": "check"},
            }),
        },
    }
}

fn execute<R: Read>(args: &CheckCommandArgs, stdin: R) -> Result<(bool, Value), CommandError> {
    let schema = load_schema(&args.schema)?;
    let input = load_input(args, stdin)?;
    let result = schema.call(input).map_err(map_evaluation_error)?;
    debug!(success = result.success(), "check finished");

    let mut payload = json!({
        "success": result.success(),
        "errors": serde_json::to_value(result.errors())
            .map_err(|err| CommandError::Internal(format!("failed to serialize errors: {err}")))?,
    });
    if args.messages {
        payload["messages"] = render_messages(result.errors(), &DefaultMessages::new());
    }
    Ok((result.success(), payload))
}

fn load_schema(path: &Path) -> Result<Schema, CommandError> {
    let format = io::resolve_format(None, Some(path), "schema").map_err(|err| {
        CommandError::usage(format!(
            "unable to resolve schema format from `{}`: {err}",
            path.display()
        ))
    })?;
    let file = File::open(path).map_err(|err| {
        CommandError::usage(format!(
            "failed to open schema file `{}`: {err}",
            path.display()
        ))
    })?;
    let raw = io::reader::read_document(file, format).map_err(map_io_as_input_usage)?;
    let document: SchemaDocument = serde_json::from_value(raw)
        .map_err(|err| CommandError::usage(format!("invalid schema document: {err}")))?;
    compile(&document, &PredicateRegistry::builtin()).map_err(map_definition_error)
}

fn load_input<R: Read>(args: &CheckCommandArgs, stdin: R) -> Result<Value, CommandError> {
    let input = match &args.input {
        Some(path) => {
            let format = io::resolve_format(args.from, Some(path), "input")
                .map_err(map_io_as_input_usage)?;
            let file = File::open(path).map_err(|err| {
                CommandError::usage(format!(
                    "failed to open input file `{}`: {err}",
                    path.display()
                ))
            })?;
            io::reader::read_document(file, format)
        }
        None => io::reader::read_document(stdin, args.from.unwrap_or(Format::Json)),
    }
    .map_err(map_io_as_input_usage)?;

    if !input.is_object() {
        return Err(CommandError::usage(
            "input must be a single mapping of attribute names to values".to_string(),
        ));
    }
    Ok(input)
}

fn map_io_as_input_usage(error: IoError) -> CommandError {
    CommandError::usage(error.to_string())
}

fn map_definition_error(error: DefinitionError) -> CommandError {
    CommandError::InputUsage {
        message: format!("invalid schema document: {error}"),
        details: json!({"kind": "schema_definition"}),
    }
}

fn map_evaluation_error(error: EvaluationError) -> CommandError {
    let EvaluationError::Predicate {
        ref path,
        ref predicate,
        ..
    } = error;
    CommandError::InputUsage {
        details: json!({
            "kind": "predicate_type_error",
            "path": path,
            "predicate": predicate,
        }),
        message: error.to_string(),
    }
}

enum CommandError {
    InputUsage { message: String, details: Value },
    Internal(String),
}

impl CommandError {
    fn usage(message: String) -> Self {
        Self::InputUsage {
            message,
            details: json!({"command": "check"}),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use serde_json::json;
    use tempfile::tempdir;

    use crate::cmd::check::{CheckCommandArgs, run_with_stdin};

    const SCHEMA: &str = r#"{
        "members": [
            {"required": "number", "filled": ["int?", {"eql?": 23}]}
        ]
    }"#;

    fn args(schema: &Path, messages: bool) -> CheckCommandArgs {
        CheckCommandArgs {
            schema: schema.to_path_buf(),
            input: None,
            from: None,
            messages,
        }
    }

    #[test]
    fn maps_success_to_exit_zero() {
        let dir = tempdir().expect("tempdir");
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, SCHEMA).expect("write schema");

        let response = run_with_stdin(&args(&schema_path, false), Cursor::new(r#"{"number":23}"#));
        assert_eq!(response.exit_code, 0);
        assert_eq!(response.payload, json!({"success": true, "errors": {}}));
    }

    #[test]
    fn maps_violations_to_exit_two() {
        let dir = tempdir().expect("tempdir");
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, SCHEMA).expect("write schema");

        let response = run_with_stdin(&args(&schema_path, true), Cursor::new("{}"));
        assert_eq!(response.exit_code, 2);
        assert_eq!(response.payload["success"], json!(false));
        assert_eq!(response.payload["errors"]["number"][0]["predicate"], json!("key?"));
        assert_eq!(
            response.payload["messages"],
            json!({"number": ["is missing", "must be equal to 23"]})
        );
    }

    #[test]
    fn maps_input_usage_to_exit_three() {
        let dir = tempdir().expect("tempdir");
        let schema_path = dir.path().join("schema.invalid");
        std::fs::write(&schema_path, SCHEMA).expect("write schema");

        let response = run_with_stdin(&args(&schema_path, false), Cursor::new("{}"));
        assert_eq!(response.exit_code, 3);
        assert_eq!(response.payload["error"], json!("input_usage_error"));
    }

    #[test]
    fn maps_predicate_type_errors_to_exit_three() {
        let dir = tempdir().expect("tempdir");
        let schema_path = dir.path().join("schema.yaml");
        std::fs::write(
            &schema_path,
            "members:\n  - required: age\n    value:\n      - gt?: 18\n",
        )
        .expect("write schema");

        let response = run_with_stdin(&args(&schema_path, false), Cursor::new(r#"{"age":"old"}"#));
        assert_eq!(response.exit_code, 3);
        assert_eq!(response.payload["details"]["kind"], json!("predicate_type_error"));
        assert_eq!(response.payload["details"]["path"], json!("age"));
    }

    #[test]
    fn rejects_non_mapping_input() {
        let dir = tempdir().expect("tempdir");
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, SCHEMA).expect("write schema");

        let response = run_with_stdin(&args(&schema_path, false), Cursor::new("[1, 2]"));
        assert_eq!(response.exit_code, 3);
    }
}
