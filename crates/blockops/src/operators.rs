//! Operator primitives.
//!
//! Each function reads its named fields from an [`InputRecord`], coerces
//! them through [`crate::cast`] and returns a fresh [`Value`]. None of
//! them fail: malformed input degrades to `0`, `""` or `false`.

use std::f64::consts::{LN_10, PI};

use tracing::debug;

use crate::cast;
use crate::error::RepeatError;
use crate::random::{RandomSource, random_between};
use crate::record::InputRecord;
use crate::value::Value;

/// Longest string the runtime will build, in UTF-16 units.
pub const MAX_STRING_UNITS: usize = (1 << 29) - 24;

fn num(args: &InputRecord, field: &str) -> f64 {
    cast::to_number(args.get(field))
}

fn text(args: &InputRecord, field: &str) -> String {
    cast::to_string(args.get(field))
}

fn folded(args: &InputRecord, field: &str) -> String {
    text(args, field).to_lowercase()
}

// =============================================================================
// Arithmetic
// =============================================================================

pub fn add(args: &InputRecord) -> Value {
    Value::Number(num(args, "NUM1") + num(args, "NUM2"))
}

pub fn subtract(args: &InputRecord) -> Value {
    Value::Number(num(args, "NUM1") - num(args, "NUM2"))
}

pub fn multiply(args: &InputRecord) -> Value {
    Value::Number(num(args, "NUM1") * num(args, "NUM2"))
}

pub fn divide(args: &InputRecord) -> Value {
    Value::Number(num(args, "NUM1") / num(args, "NUM2"))
}

/// Floored modulo: the result takes the sign of the divisor.
pub fn modulo(args: &InputRecord) -> Value {
    Value::Number(floored_mod(num(args, "NUM1"), num(args, "NUM2")))
}

pub fn floored_mod(n: f64, modulus: f64) -> f64 {
    let mut result = n % modulus;
    if result / modulus < 0.0 {
        result += modulus;
    }
    result
}

pub fn round(args: &InputRecord) -> Value {
    Value::Number(round_half_up(num(args, "NUM")))
}

/// Round to the nearest integer, halves toward positive infinity.
pub fn round_half_up(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let floor = x.floor();
    let rounded = if x - floor >= 0.5 { floor + 1.0 } else { floor };
    if rounded == 0.0 {
        0.0_f64.copysign(x)
    } else {
        rounded
    }
}

pub fn power(args: &InputRecord) -> Value {
    let base = num(args, "NUM1");
    let exponent = num(args, "NUM2");
    // powf says 1^inf = 1; the block language says NaN.
    if base.abs() == 1.0 && exponent.is_infinite() {
        return Value::Number(f64::NAN);
    }
    Value::Number(base.powf(exponent))
}

pub fn neg(args: &InputRecord) -> Value {
    Value::Number(-num(args, "NUM"))
}

// =============================================================================
// Comparison
// =============================================================================

fn compare_operands(args: &InputRecord) -> std::cmp::Ordering {
    cast::compare(args.get("OPERAND1"), args.get("OPERAND2"))
}

pub fn lt(args: &InputRecord) -> Value {
    Value::Boolean(compare_operands(args).is_lt())
}

pub fn equals(args: &InputRecord) -> Value {
    Value::Boolean(compare_operands(args).is_eq())
}

pub fn gt(args: &InputRecord) -> Value {
    Value::Boolean(compare_operands(args).is_gt())
}

pub fn gt_or_eq(args: &InputRecord) -> Value {
    Value::Boolean(compare_operands(args).is_ge())
}

pub fn lt_or_eq(args: &InputRecord) -> Value {
    Value::Boolean(compare_operands(args).is_le())
}

/// Strict equality: no coercion, different variants are never identical.
pub fn identical(args: &InputRecord) -> Value {
    Value::Boolean(strict_equals(args.get("OPERAND1"), args.get("OPERAND2")))
}

pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Empty, Value::Empty) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::List(x), Value::List(y)) => x.ptr_eq(y),
        _ => false,
    }
}

// =============================================================================
// Boolean
// =============================================================================

fn truthy(args: &InputRecord, field: &str) -> bool {
    cast::to_boolean(args.get(field))
}

pub fn and(args: &InputRecord) -> Value {
    Value::Boolean(truthy(args, "OPERAND1") && truthy(args, "OPERAND2"))
}

pub fn or(args: &InputRecord) -> Value {
    Value::Boolean(truthy(args, "OPERAND1") || truthy(args, "OPERAND2"))
}

pub fn not(args: &InputRecord) -> Value {
    Value::Boolean(!truthy(args, "OPERAND"))
}

pub fn xor(args: &InputRecord) -> Value {
    Value::Boolean(truthy(args, "OPERAND1") != truthy(args, "OPERAND2"))
}

/// `VALUE` passed through untouched. Backs both `bool` and `identity`.
pub fn passthrough(args: &InputRecord) -> Value {
    args.get("VALUE").clone()
}

pub fn literal_true(_args: &InputRecord) -> Value {
    Value::Boolean(true)
}

pub fn literal_false(_args: &InputRecord) -> Value {
    Value::Boolean(false)
}

// =============================================================================
// Strings (1-based, positions count Unicode scalar values)
// =============================================================================

pub fn join(args: &InputRecord) -> Value {
    let mut joined = text(args, "STRING1");
    joined.push_str(&text(args, "STRING2"));
    Value::String(joined)
}

pub fn letter_of(args: &InputRecord) -> Value {
    let index = num(args, "LETTER") - 1.0;
    let s = text(args, "STRING");
    let len = s.chars().count();
    if index < 0.0 || index >= len as f64 {
        return Value::String(String::new());
    }
    let letter = s.chars().nth(index as usize).map(String::from).unwrap_or_default();
    Value::String(letter)
}

/// Inclusive substring between two 1-based bounds. Reversed bounds give "".
pub fn letters_of(args: &InputRecord) -> Value {
    let s = text(args, "STRING");
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as f64;
    let clamp = |n: f64| n.trunc().clamp(0.0, len) as usize;
    let start = clamp(num(args, "LETTER1") - 1.0);
    let end = clamp(num(args, "LETTER2"));
    if start >= end {
        return Value::String(String::new());
    }
    Value::String(chars[start..end].iter().collect())
}

pub fn length(args: &InputRecord) -> Value {
    Value::Number(text(args, "STRING").chars().count() as f64)
}

pub fn contains(args: &InputRecord) -> Value {
    Value::Boolean(folded(args, "STRING1").contains(&folded(args, "STRING2")))
}

/// Number of non-overlapping, case-insensitive occurrences.
pub fn count(args: &InputRecord) -> Value {
    let haystack = folded(args, "STRING");
    let needle = folded(args, "SUBSTRING");
    let pieces = split_native(&haystack, &needle).len();
    Value::Number(pieces as f64 - 1.0)
}

/// Item `ITEM` (1-based) of the lower-cased string split on `SPLIT`.
pub fn split(args: &InputRecord) -> Value {
    let haystack = folded(args, "STRING");
    let separator = folded(args, "SPLIT");
    let parts = split_native(&haystack, &separator);
    cast::to_list_index(args.get("ITEM"), parts.len(), false)
        .offset()
        .and_then(|i| parts.get(i))
        .map(|part| Value::String(part.to_string()))
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Split the way the block language does: an empty separator yields one
/// piece per character, and an empty string split that way has no pieces.
fn split_native<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return s
            .char_indices()
            .map(|(i, c)| &s[i..i + c.len_utf8()])
            .collect();
    }
    s.split(separator).collect()
}

/// Replace every occurrence of `SUBSTRING` (case-sensitive).
pub fn replace(args: &InputRecord) -> Value {
    let s = text(args, "STRING");
    let pattern = text(args, "SUBSTRING");
    let replacement = text(args, "REPLACE");
    Value::String(replace_all(&s, &pattern, &replacement))
}

fn replace_all(s: &str, pattern: &str, replacement: &str) -> String {
    if !replacement.contains('$') {
        return s.replace(pattern, replacement);
    }
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (start, matched) in s.match_indices(pattern) {
        let end = start + matched.len();
        out.push_str(&s[last..start]);
        expand_replacement(&mut out, replacement, matched, &s[..start], &s[end..]);
        last = end;
    }
    out.push_str(&s[last..]);
    out
}

/// Apply `$$`, `$&`, `` $` `` and `$'` substitution patterns.
fn expand_replacement(out: &mut String, replacement: &str, matched: &str, before: &str, after: &str) {
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => out.push('$'),
            Some('&') => out.push_str(matched),
            Some('`') => out.push_str(before),
            Some('\'') => out.push_str(after),
            _ => {
                out.push('$');
                continue;
            }
        }
        chars.next();
    }
}

/// 1-based position of the first case-insensitive match, `0` if none.
pub fn index_of(args: &InputRecord) -> Value {
    let haystack = folded(args, "STRING");
    let needle = folded(args, "SUBSTRING");
    let position = haystack
        .find(&needle)
        .map(|byte| haystack[..byte].chars().count() + 1)
        .unwrap_or(0);
    Value::Number(position as f64)
}

pub fn repeat(args: &InputRecord) -> Value {
    let s = text(args, "STRING");
    let times = num(args, "REPEAT");
    match repeat_text(&s, times) {
        Ok(repeated) => Value::String(repeated),
        Err(err) => {
            debug!(error = %err, "repeat fell back to empty string");
            Value::String(String::new())
        }
    }
}

/// Repeat `s`, truncating a fractional count toward zero.
pub fn repeat_text(s: &str, times: f64) -> Result<String, RepeatError> {
    if times.is_infinite() {
        return Err(RepeatError::InfiniteCount);
    }
    let times = times.trunc();
    if times < 0.0 {
        return Err(RepeatError::NegativeCount(times));
    }
    let units = s.encode_utf16().count() as f64 * times;
    if units > MAX_STRING_UNITS as f64 {
        return Err(RepeatError::TooLong {
            units: units as usize,
        });
    }
    Ok(s.repeat(times as usize))
}

// =============================================================================
// Math functions (angles in degrees)
// =============================================================================

pub fn mathop(args: &InputRecord) -> Value {
    let operator = folded(args, "OPERATOR");
    let n = num(args, "NUM");
    Value::Number(apply_math(&operator, n))
}

/// Apply a math keyword. Unknown keywords give `0`.
pub fn apply_math(operator: &str, n: f64) -> f64 {
    match operator {
        "abs" => n.abs(),
        "floor" => n.floor(),
        "ceiling" => n.ceil(),
        "sqrt" => n.sqrt(),
        "sin" => round_half_up(((PI * n) / 180.0).sin() * 1e10) / 1e10,
        "cos" => round_half_up(((PI * n) / 180.0).cos() * 1e10) / 1e10,
        "tan" => tan_degrees(n),
        "asin" => (n.asin() * 180.0) / PI,
        "acos" => (n.acos() * 180.0) / PI,
        "atan" => (n.atan() * 180.0) / PI,
        "ln" => n.ln(),
        "log" => n.ln() / LN_10,
        "e ^" => n.exp(),
        "10 ^" => 10.0_f64.powf(n),
        "sign" => sign(n),
        _ => 0.0,
    }
}

fn tan_degrees(n: f64) -> f64 {
    let angle = n % 360.0;
    if angle == 90.0 || angle == -270.0 {
        f64::INFINITY
    } else if angle == -90.0 || angle == 270.0 {
        f64::NEG_INFINITY
    } else {
        round_to_places(((PI * angle) / 180.0).tan(), 10)
    }
}

fn round_to_places(x: f64, places: usize) -> f64 {
    format!("{:.*}", places, x).parse().unwrap_or(x)
}

/// Sign of `n`; never negative zero.
fn sign(n: f64) -> f64 {
    if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// =============================================================================
// Unicode
// =============================================================================

/// Code points of every character, space-separated.
pub fn unicode_of(args: &InputRecord) -> Value {
    let codes: Vec<String> = text(args, "STRING")
        .chars()
        .map(|c| (c as u32).to_string())
        .collect();
    Value::String(codes.join(" "))
}

/// One-character string for a code point; "" when it is not a valid one.
pub fn unicode_from(args: &InputRecord) -> Value {
    let code = num(args, "NUM").trunc();
    let letter = if (0.0..=char::MAX as u32 as f64).contains(&code) {
        char::from_u32(code as u32).map(String::from)
    } else {
        None
    };
    Value::String(letter.unwrap_or_default())
}

// =============================================================================
// Random
// =============================================================================

pub fn random(args: &InputRecord, rng: &mut dyn RandomSource) -> Value {
    Value::Number(random_between(args.get("FROM"), args.get("TO"), rng))
}
