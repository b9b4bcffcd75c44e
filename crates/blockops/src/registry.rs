//! Opcode → operator dispatch table.
//!
//! Built once per process and never mutated afterwards, so it can be shared
//! freely between concurrent evaluations.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::error::EvalError;
use crate::operators as ops;
use crate::random::{RandomSource, ThreadRandom};
use crate::record::InputRecord;
use crate::value::Value;

/// How an operator is invoked. Only `Random` operators see the random
/// source; everything else is a pure function of its inputs.
#[derive(Clone, Copy)]
pub enum OperatorFn {
    Pure(fn(&InputRecord) -> Value),
    Random(fn(&InputRecord, &mut dyn RandomSource) -> Value),
}

/// One registry entry.
#[derive(Clone, Copy)]
pub struct OperatorSpec {
    pub opcode: &'static str,
    /// Input fields the operator reads.
    pub fields: &'static [&'static str],
    pub func: OperatorFn,
}

impl OperatorSpec {
    const fn pure(
        opcode: &'static str,
        fields: &'static [&'static str],
        func: fn(&InputRecord) -> Value,
    ) -> Self {
        Self {
            opcode,
            fields,
            func: OperatorFn::Pure(func),
        }
    }

    pub fn call(&self, args: &InputRecord, rng: &mut dyn RandomSource) -> Value {
        match self.func {
            OperatorFn::Pure(f) => f(args),
            OperatorFn::Random(f) => f(args, rng),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self.func, OperatorFn::Pure(_))
    }

    pub fn accepts_field(&self, name: &str) -> bool {
        self.fields.contains(&name)
    }
}

impl std::fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("opcode", &self.opcode)
            .field("fields", &self.fields)
            .field("deterministic", &self.is_deterministic())
            .finish()
    }
}

const NUMS: &[&str] = &["NUM1", "NUM2"];
const NUM: &[&str] = &["NUM"];
const OPERANDS: &[&str] = &["OPERAND1", "OPERAND2"];
const VALUE: &[&str] = &["VALUE"];
const NONE: &[&str] = &[];

const OPERATORS: &[OperatorSpec] = &[
    OperatorSpec::pure("operator_add", NUMS, ops::add),
    OperatorSpec::pure("operator_subtract", NUMS, ops::subtract),
    OperatorSpec::pure("operator_multiply", NUMS, ops::multiply),
    OperatorSpec::pure("operator_divide", NUMS, ops::divide),
    OperatorSpec::pure("operator_lt", OPERANDS, ops::lt),
    OperatorSpec::pure("operator_equals", OPERANDS, ops::equals),
    OperatorSpec::pure("operator_gt", OPERANDS, ops::gt),
    OperatorSpec::pure("operator_and", OPERANDS, ops::and),
    OperatorSpec::pure("operator_or", OPERANDS, ops::or),
    OperatorSpec::pure("operator_not", &["OPERAND"], ops::not),
    OperatorSpec {
        opcode: "operator_random",
        fields: &["FROM", "TO"],
        func: OperatorFn::Random(ops::random),
    },
    OperatorSpec::pure("operator_join", &["STRING1", "STRING2"], ops::join),
    OperatorSpec::pure("operator_letter_of", &["LETTER", "STRING"], ops::letter_of),
    OperatorSpec::pure("operator_length", &["STRING"], ops::length),
    OperatorSpec::pure("operator_contains", &["STRING1", "STRING2"], ops::contains),
    OperatorSpec::pure("operator_mod", NUMS, ops::modulo),
    OperatorSpec::pure("operator_round", NUM, ops::round),
    OperatorSpec::pure("operator_mathop", &["OPERATOR", "NUM"], ops::mathop),
    OperatorSpec::pure("operator_bool", VALUE, ops::passthrough),
    OperatorSpec::pure("operator_identity", VALUE, ops::passthrough),
    OperatorSpec::pure("operator_gtoreq", OPERANDS, ops::gt_or_eq),
    OperatorSpec::pure("operator_ltoreq", OPERANDS, ops::lt_or_eq),
    OperatorSpec::pure("operator_power", NUMS, ops::power),
    OperatorSpec::pure("operator_identical", OPERANDS, ops::identical),
    OperatorSpec::pure("operator_neg", NUM, ops::neg),
    OperatorSpec::pure("operator_unicodeof", &["STRING"], ops::unicode_of),
    OperatorSpec::pure("operator_unicodefrom", NUM, ops::unicode_from),
    OperatorSpec::pure("operator_true", NONE, ops::literal_true),
    OperatorSpec::pure("operator_false", NONE, ops::literal_false),
    OperatorSpec::pure("operator_xor", OPERANDS, ops::xor),
    OperatorSpec::pure(
        "operator_letters_of",
        &["STRING", "LETTER1", "LETTER2"],
        ops::letters_of,
    ),
    OperatorSpec::pure("operator_count", &["STRING", "SUBSTRING"], ops::count),
    OperatorSpec::pure("operator_split", &["STRING", "SPLIT", "ITEM"], ops::split),
    OperatorSpec::pure(
        "operator_replace",
        &["STRING", "SUBSTRING", "REPLACE"],
        ops::replace,
    ),
    OperatorSpec::pure("operator_indexof", &["STRING", "SUBSTRING"], ops::index_of),
    OperatorSpec::pure("operator_repeat", &["STRING", "REPEAT"], ops::repeat),
];

/// Immutable opcode lookup, in declaration order.
pub struct OperatorRegistry {
    specs: &'static [OperatorSpec],
    by_opcode: HashMap<&'static str, usize>,
}

impl OperatorRegistry {
    fn build() -> Self {
        let by_opcode = OPERATORS
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.opcode, i))
            .collect();
        Self {
            specs: OPERATORS,
            by_opcode,
        }
    }

    pub fn get(&self, opcode: &str) -> Option<&OperatorSpec> {
        self.by_opcode.get(opcode).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.by_opcode.contains_key(opcode)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorSpec> {
        self.specs.iter()
    }

    pub fn opcodes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.opcode)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// The process-wide registry.
pub fn registry() -> &'static OperatorRegistry {
    static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(OperatorRegistry::build)
}

/// Evaluate `opcode` with the default random source. An unknown opcode
/// logs a warning and yields [`Value::Empty`].
pub fn evaluate(opcode: &str, args: &InputRecord) -> Value {
    evaluate_with(opcode, args, &mut ThreadRandom)
}

pub fn evaluate_with(opcode: &str, args: &InputRecord, rng: &mut dyn RandomSource) -> Value {
    match try_evaluate(opcode, args, rng) {
        Ok(value) => value,
        Err(err) => {
            warn!(opcode, "{}", err);
            Value::Empty
        }
    }
}

pub fn try_evaluate(
    opcode: &str,
    args: &InputRecord,
    rng: &mut dyn RandomSource,
) -> Result<Value, EvalError> {
    let spec = registry()
        .get(opcode)
        .ok_or_else(|| EvalError::unknown_opcode(opcode))?;
    let value = spec.call(args, rng);
    debug!(opcode, result = %value, "evaluated operator");
    Ok(value)
}
