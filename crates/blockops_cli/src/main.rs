use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use blockops::{
    CallFile, CallOutcome, InputRecord, RandomSource, SeededRandom, ThreadRandom, Value, parse_call_file,
    registry, run_call_file_with, try_evaluate, validate_call_file,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::{Value as JsonValue, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockops")]
#[command(version, about = "Evaluate block operator primitives")]
struct Cli {
    /// Log operator dispatch (overrides RUST_LOG).
    #[arg(short, long, global = true, action = ArgAction::SetTrue, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a single opcode.
    Eval {
        opcode: String,
        /// Input field as NAME=VALUE; VALUE is read as JSON, else as a string.
        #[arg(short = 'a', long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,
        /// All inputs as a JSON object.
        #[arg(long)]
        inputs: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List opcodes and their input fields.
    List {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate and run a call file.
    Run {
        #[arg(short, long)]
        file: PathBuf,
        /// Overrides the file's seed.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate a call file without running it.
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(command: Command) -> Result<ExitCode> {
    match command {
        Command::Eval {
            opcode,
            args,
            inputs,
            seed,
            format,
        } => {
            let record = build_record(inputs.as_deref(), &args)?;
            let mut rng = random_source(seed);
            let value = try_evaluate(&opcode, &record, rng.as_mut())?;
            match format {
                Format::Text => println!("{}", value),
                Format::Json => println!("{}", value.to_json()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::List { format } => {
            print_registry(format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { file, seed, format } => run_file(&file, seed, format),
        Command::Validate { file } => {
            let calls = load_call_file(&file)?;
            match validate_call_file(&calls) {
                Ok(()) => {
                    println!("ok");
                    Ok(ExitCode::SUCCESS)
                }
                Err(errors) => {
                    for err in &errors {
                        eprintln!("{}", err);
                    }
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    }
}

fn build_record(inputs: Option<&str>, args: &[String]) -> Result<InputRecord> {
    let mut record = match inputs {
        Some(json) => {
            let value: JsonValue = serde_json::from_str(json).context("--inputs is not valid JSON")?;
            match value {
                JsonValue::Object(map) => InputRecord::from(map),
                _ => bail!("--inputs must be a JSON object"),
            }
        }
        None => InputRecord::new(),
    };
    for arg in args {
        let (name, raw) = arg
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got '{}'", arg))?;
        record.insert(name, parse_arg_value(raw));
    }
    Ok(record)
}

/// `3` is a number and `"3"` a string; anything that is not JSON is taken
/// verbatim as a string.
fn parse_arg_value(raw: &str) -> Value {
    serde_json::from_str::<JsonValue>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

fn print_registry(format: Format) -> Result<()> {
    match format {
        Format::Text => {
            for spec in registry().iter() {
                println!("{} {}", spec.opcode, spec.fields.join(" "));
            }
        }
        Format::Json => {
            let entries: Vec<JsonValue> = registry()
                .iter()
                .map(|spec| {
                    json!({
                        "opcode": spec.opcode,
                        "fields": spec.fields,
                        "deterministic": spec.is_deterministic(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

fn load_call_file(path: &Path) -> Result<CallFile> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_call_file(&yaml).with_context(|| format!("failed to parse {}", path.display()))
}

fn run_file(path: &Path, seed: Option<u64>, format: Format) -> Result<ExitCode> {
    let calls = load_call_file(path)?;
    if let Err(errors) = validate_call_file(&calls) {
        for err in &errors {
            eprintln!("{}", err);
        }
        bail!("{} validation error(s) in {}", errors.len(), path.display());
    }

    let seed = seed.or(calls.seed);
    info!(file = %path.display(), calls = calls.calls.len(), ?seed, "running call file");
    let mut rng = random_source(seed);
    let outcomes = run_call_file_with(&calls, rng.as_mut());
    match format {
        Format::Text => {
            for outcome in &outcomes {
                println!("{}", describe(outcome));
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
    }

    let failures = outcomes.iter().filter(|o| o.failed()).count();
    if failures > 0 {
        eprintln!("{} of {} expectation(s) failed", failures, outcomes.len());
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(outcome: &CallOutcome) -> String {
    match (&outcome.expected, outcome.passed) {
        (Some(expected), Some(false)) => format!(
            "FAIL {}: {} (expected {})",
            outcome.label, outcome.result, expected
        ),
        (Some(_), _) => format!("ok   {}: {}", outcome.label, outcome.result),
        (None, _) => format!("     {}: {}", outcome.label, outcome.result),
    }
}
