use std::io;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rulecheck::cmd::{check, predicates};
use rulecheck::io::Format;
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rulecheck",
    version,
    about = "Declarative validation of JSON/YAML documents against rule schemas"
)]
struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate one input mapping against a schema document.
    Check(CheckArgs),
    /// List the built-in predicates.
    Predicates,
}

#[derive(Debug, clap::Args)]
struct CheckArgs {
    #[arg(long)]
    schema: PathBuf,

    /// Input file; stdin when absent.
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum)]
    from: Option<CliInputFormat>,

    /// Add human-readable messages mirroring the error shape.
    #[arg(long, default_value_t = false)]
    messages: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliInputFormat {
    Json,
    Yaml,
}

impl From<CliInputFormat> for Format {
    fn from(value: CliInputFormat) -> Self {
        match value {
            CliInputFormat::Json => Self::Json,
            CliInputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Serialize)]
struct CliError<'a> {
    error: &'a str,
    message: String,
    code: i32,
    details: Value,
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return handle_parse_error(error),
    };
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Predicates => run_predicates(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn handle_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{error}");
            0
        }
        _ => {
            emit_error(
                "input_usage_error",
                error.to_string(),
                json!({"kind": "cli_parse_error"}),
                3,
            );
            3
        }
    }
}

fn run_check(args: CheckArgs) -> i32 {
    let command_args = check::CheckCommandArgs {
        schema: args.schema,
        input: args.input,
        from: args.from.map(Into::into),
        messages: args.messages,
    };
    tracing::debug!(schema = %command_args.schema.display(), "running check");

    let stdin = io::stdin();
    let response = check::run_with_stdin(&command_args, stdin.lock());
    emit_response("check", response.exit_code, &response.payload)
}

fn run_predicates() -> i32 {
    let response = predicates::run();
    emit_response("predicates", response.exit_code, &response.payload)
}

/// Exit codes 0 and 2 print the payload on stdout, 1 and 3 on stderr.
fn emit_response(command: &str, exit_code: i32, payload: &Value) -> i32 {
    let emitted = match exit_code {
        0 | 2 => emit_json_stdout(payload),
        1 | 3 => emit_json_stderr(payload),
        other => {
            emit_error(
                "internal_error",
                format!("unexpected {command} exit code: {other}"),
                json!({"command": command}),
                1,
            );
            return 1;
        }
    };
    if emitted {
        exit_code
    } else {
        emit_error(
            "internal_error",
            format!("failed to serialize {command} response"),
            json!({"command": command}),
            1,
        );
        1
    }
}

fn emit_json_stdout(value: &Value) -> bool {
    match serde_json::to_string(value) {
        Ok(serialized) => {
            println!("{serialized}");
            true
        }
        Err(_) => false,
    }
}

fn emit_json_stderr(value: &Value) -> bool {
    match serde_json::to_string(value) {
        Ok(serialized) => {
            eprintln!("{serialized}");
            true
        }
        Err(_) => false,
    }
}

fn emit_error(error: &'static str, message: String, details: Value, code: i32) {
    let payload = CliError {
        error,
        message,
        code,
        details,
    };
    match serde_json::to_string(&payload) {
        Ok(serialized) => eprintln!("{serialized}"),
        Err(_) => eprintln!(
            "{{\"error\":\"internal_error\",\"message\":\"failed to serialize error\",\"code\":1}}"
        ),
    }
}
