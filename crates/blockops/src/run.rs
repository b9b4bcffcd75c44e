use serde::Serialize;
use tracing::debug;

use crate::cast;
use crate::model::CallFile;
use crate::operators::strict_equals;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::registry::evaluate_with;
use crate::value::Value;

/// Result of one call in a call file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub index: usize,
    pub label: String,
    pub opcode: String,
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// `None` when the call has no expectation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

impl CallOutcome {
    pub fn failed(&self) -> bool {
        self.passed == Some(false)
    }
}

/// Run every call in order. Uses a seeded source when the file has a
/// `seed`, the thread-local generator otherwise.
pub fn run_call_file(file: &CallFile) -> Vec<CallOutcome> {
    match file.seed {
        Some(seed) => run_call_file_with(file, &mut SeededRandom::new(seed)),
        None => run_call_file_with(file, &mut ThreadRandom),
    }
}

pub fn run_call_file_with(file: &CallFile, rng: &mut dyn RandomSource) -> Vec<CallOutcome> {
    file.calls
        .iter()
        .enumerate()
        .map(|(index, call)| {
            let result = evaluate_with(&call.opcode, &call.record(), rng);
            let expected = call.expected();
            let passed = expected
                .as_ref()
                .map(|expected| matches_expectation(&result, expected));
            debug!(index, opcode = %call.opcode, ?passed, "ran call");
            CallOutcome {
                index,
                label: call.label(index),
                opcode: call.opcode.clone(),
                result,
                expected,
                passed,
            }
        })
        .collect()
}

/// Booleans must match exactly; anything else matches when it compares
/// equal under the usual coercion rules.
pub fn matches_expectation(result: &Value, expected: &Value) -> bool {
    match expected {
        Value::Boolean(_) => strict_equals(result, expected),
        _ => cast::compare(result, expected).is_eq(),
    }
}
