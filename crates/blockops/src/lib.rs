//! Operator primitives for block-based programs.
//!
//! Block inputs arrive as untyped [`Value`]s. The [`cast`] module turns them
//! into numbers, booleans and strings following fixed fallback rules, and
//! the [`registry`] maps opcodes such as `operator_add` to the pure
//! functions in [`operators`]. No operator fails on malformed input.

pub mod cast;
mod error;
mod model;
pub mod operators;
pub mod random;
mod record;
pub mod registry;
mod run;
mod validator;
mod value;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cast::{ListIndex, compare, to_boolean, to_list_index, to_number, to_string};
pub use error::{CallError, ErrorCode, EvalError, RepeatError, ValidationResult};
pub use model::{Call, CallFile};
pub use random::{RandomSource, SeededRandom, ThreadRandom, random_between};
pub use record::InputRecord;
pub use registry::{
    OperatorFn, OperatorRegistry, OperatorSpec, evaluate, evaluate_with, registry, try_evaluate,
};
pub use run::{CallOutcome, matches_expectation, run_call_file, run_call_file_with};
pub use validator::validate_call_file;
pub use value::{ListRef, Value, format_number};

pub fn parse_call_file(yaml: &str) -> Result<CallFile, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}
