//! Coercion engine.
//!
//! Every function here is total: malformed input resolves to a fallback
//! value instead of an error. Operators never look at a value's variant to
//! decide what it "is"; they coerce it and use the result.

use std::cmp::Ordering;

use crate::random::{RandomSource, ThreadRandom};
use crate::value::{Value, format_number};

/// Result of resolving a 1-based list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIndex {
    /// Valid position in `1..=length`.
    Index(usize),
    /// The `"all"` keyword, only produced when the caller accepts it.
    All,
    Invalid,
}

impl ListIndex {
    /// Zero-based offset for a concrete index.
    pub fn offset(self) -> Option<usize> {
        match self {
            ListIndex::Index(i) => Some(i - 1),
            ListIndex::All | ListIndex::Invalid => None,
        }
    }
}

/// NEL is Unicode whitespace but not a separator in numeric text.
fn is_blank_char(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

fn is_blank(s: &str) -> bool {
    s.chars().all(is_blank_char)
}

/// Numeric-string detection.
///
/// Returns `None` when the string does not denote a number. Blank strings
/// denote zero. Accepts decimal literals, signed `Infinity`, and unsigned
/// `0x`/`0o`/`0b` integers. Words like `NaN` or `inf` are not numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim_matches(is_blank_char);
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&trimmed[2..], radix);
    }

    // Rust's float parser also takes "inf" and "nan"; only hand it
    // strings made of literal characters.
    let literal = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !literal {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

/// Coerce to a number. Never returns NaN.
pub fn to_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => *n,
        Value::Boolean(b) => bool_to_number(*b),
        Value::String(s) => parse_number(s).unwrap_or(0.0),
        Value::Empty => 0.0,
        Value::List(list) => match list.items() {
            [] => 0.0,
            [only] => parse_number(&to_string(only)).unwrap_or(0.0),
            _ => 0.0,
        },
    };
    if n.is_nan() { 0.0 } else { n }
}

fn bool_to_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Coerce to a boolean.
///
/// Strings are true unless they are `""`, `"0"` or exactly `"false"`.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !(s.is_empty() || s == "0" || s == "false"),
        Value::Empty => false,
        Value::List(_) => true,
    }
}

/// Canonical string form.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Boolean(b) => b.to_string(),
        Value::List(list) => list
            .items()
            .iter()
            .map(to_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Whether the raw value already denotes an integer. Only `random` uses
/// this, to decide between an integer and a continuous result.
pub fn is_int(value: &Value) -> bool {
    match value {
        // NaN coerces to 0, which is integral.
        Value::Number(n) => n.is_nan() || n.fract() == 0.0,
        Value::Boolean(_) => true,
        Value::String(s) => !s.contains('.'),
        Value::Empty | Value::List(_) => false,
    }
}

/// The number a value stands for in a comparison, if it cleanly is one.
/// Blank strings and empty slots are not numeric here, so `"" = 0`
/// compares as text. Lists go through their joined text without that
/// check, so `[] = 0` is numeric.
fn comparable_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => *n,
        Value::Boolean(b) => bool_to_number(*b),
        Value::String(s) => {
            if is_blank(s) {
                return None;
            }
            parse_number(s)?
        }
        Value::Empty => return None,
        Value::List(_) => parse_number(&to_string(value))?,
    };
    (!n.is_nan()).then_some(n)
}

/// Three-way comparison: numeric when both sides are numbers, otherwise
/// case-insensitive by code point.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (comparable_number(a), comparable_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    let left = to_string(a).to_lowercase();
    let right = to_string(b).to_lowercase();
    left.cmp(&right)
}

/// Resolve a 1-based list index using the default random source.
pub fn to_list_index(raw: &Value, length: usize, accept_all: bool) -> ListIndex {
    to_list_index_with(raw, length, accept_all, &mut ThreadRandom)
}

/// Resolve a 1-based list index.
///
/// Non-integers and positions outside `1..=length` are invalid. With
/// `accept_all`, the keywords `all`, `last`, `random` and `any` are
/// understood; `rng` is only consulted for `random`/`any`.
pub fn to_list_index_with(
    raw: &Value,
    length: usize,
    accept_all: bool,
    rng: &mut dyn RandomSource,
) -> ListIndex {
    if let Value::String(keyword) = raw {
        match keyword.as_str() {
            "all" | "last" | "random" | "any" if !accept_all => return ListIndex::Invalid,
            "all" => return ListIndex::All,
            "last" if length > 0 => return ListIndex::Index(length),
            "random" | "any" if length > 0 => {
                let offset = (rng.next_f64() * length as f64).floor() as usize;
                return ListIndex::Index(offset.min(length - 1) + 1);
            }
            "last" | "random" | "any" => return ListIndex::Invalid,
            _ => {}
        }
    }

    let n = to_number(raw);
    if n.fract() != 0.0 || n < 1.0 || n > length as f64 {
        return ListIndex::Invalid;
    }
    ListIndex::Index(n as usize)
}

#[cfg(test)]
mod cast_tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  -3.5 "), Some(-3.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number("0b101"), Some(5.0));
        assert_eq!(parse_number("0o17"), Some(15.0));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number(""), Some(0.0));
    }

    #[test]
    fn test_parse_number_blank_characters() {
        assert_eq!(parse_number("\t\n 8\u{a0}"), Some(8.0));
        assert_eq!(parse_number("\u{feff}8\u{2028}"), Some(8.0));
        assert_eq!(parse_number("\u{3000}"), Some(0.0));
        assert_eq!(parse_number("\u{85}5"), None);
        assert_eq!(to_number(&s("\u{85}5")), 0.0);
    }

    #[test]
    fn test_parse_number_rejects_words() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("infinity"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("-0x10"), None);
        assert_eq!(parse_number("1e"), None);
        assert_eq!(parse_number("."), None);
    }

    #[test]
    fn test_to_number_fallbacks() {
        assert_eq!(to_number(&s("abc")), 0.0);
        assert_eq!(to_number(&s("")), 0.0);
        assert_eq!(to_number(&s("NaN")), 0.0);
        assert_eq!(to_number(&n(f64::NAN)), 0.0);
        assert_eq!(to_number(&Value::Empty), 0.0);
        assert_eq!(to_number(&Value::Boolean(true)), 1.0);
        assert_eq!(to_number(&Value::Boolean(false)), 0.0);
        assert_eq!(to_number(&Value::list(vec![s("7")])), 7.0);
        assert_eq!(to_number(&Value::list(vec![n(1.0), n(2.0)])), 0.0);
    }

    #[test]
    fn test_to_boolean() {
        assert!(!to_boolean(&s("")));
        assert!(!to_boolean(&s("0")));
        assert!(!to_boolean(&s("false")));
        assert!(to_boolean(&s("FALSE")));
        assert!(to_boolean(&s("-1")));
        assert!(to_boolean(&s("0.0")));
        assert!(!to_boolean(&n(0.0)));
        assert!(!to_boolean(&n(-0.0)));
        assert!(!to_boolean(&n(f64::NAN)));
        assert!(to_boolean(&n(0.5)));
        assert!(!to_boolean(&Value::Empty));
        assert!(to_boolean(&Value::list(vec![])));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(&n(3.0)), "3");
        assert_eq!(to_string(&n(0.1)), "0.1");
        assert_eq!(to_string(&Value::Boolean(true)), "true");
        assert_eq!(to_string(&Value::Empty), "");
        assert_eq!(to_string(&Value::list(vec![n(1.0), s("b")])), "1,b");
    }

    #[test]
    fn test_is_int() {
        assert!(is_int(&n(4.0)));
        assert!(!is_int(&n(4.5)));
        assert!(is_int(&Value::Boolean(false)));
        assert!(is_int(&s("10")));
        assert!(!is_int(&s("10.0")));
        assert!(!is_int(&Value::Empty));
    }

    #[test]
    fn test_compare_numeric_strings() {
        assert_eq!(compare(&s("10"), &s("9")), Ordering::Greater);
        assert_eq!(compare(&n(5.0), &s("5")), Ordering::Equal);
        assert_eq!(compare(&s(" 5 "), &n(5.0)), Ordering::Equal);
        assert_eq!(compare(&Value::Boolean(true), &n(1.0)), Ordering::Equal);
        assert_eq!(compare(&n(f64::INFINITY), &s("Infinity")), Ordering::Equal);
    }

    #[test]
    fn test_compare_falls_back_to_text() {
        assert_eq!(compare(&s("apple"), &s("BANANA")), Ordering::Less);
        assert_eq!(compare(&s("Hello"), &s("hello")), Ordering::Equal);
        assert_eq!(compare(&s(""), &n(0.0)), Ordering::Less);
        assert_eq!(compare(&s("NaN"), &s("nan")), Ordering::Equal);
        assert_eq!(compare(&Value::Empty, &s("")), Ordering::Equal);
        assert_eq!(compare(&Value::list(vec![n(1.0), n(2.0)]), &s("1,2")), Ordering::Equal);
        // "10" vs "9a": not both numeric, so compared as text
        assert_eq!(compare(&s("10"), &s("9a")), Ordering::Less);
    }

    #[test]
    fn test_compare_lists_by_joined_text() {
        assert_eq!(compare(&Value::list(vec![]), &n(0.0)), Ordering::Equal);
        assert_eq!(compare(&Value::list(vec![s(" ")]), &n(0.0)), Ordering::Equal);
        assert_eq!(compare(&Value::list(vec![s("7")]), &s("7.0")), Ordering::Equal);
        assert_eq!(compare(&Value::list(vec![]), &s("")), Ordering::Equal);
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let values = [
            n(0.0),
            n(-1.5),
            n(f64::NAN),
            n(f64::INFINITY),
            s(""),
            s(" "),
            s("abc"),
            s("ABD"),
            s("12"),
            s("0x10"),
            Value::Boolean(true),
            Value::Empty,
            Value::list(vec![n(2.0)]),
            Value::list(vec![]),
            Value::list(vec![s(" ")]),
        ];
        for a in &values {
            for b in &values {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_to_list_index_bounds() {
        assert_eq!(to_list_index(&n(1.0), 3, false), ListIndex::Index(1));
        assert_eq!(to_list_index(&s("3"), 3, false), ListIndex::Index(3));
        assert_eq!(to_list_index(&n(0.0), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&n(-1.0), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&n(1.5), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&n(4.0), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&n(f64::INFINITY), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&n(1.0), 0, false), ListIndex::Invalid);
    }

    #[test]
    fn test_to_list_index_keywords() {
        assert_eq!(to_list_index(&s("last"), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&s("all"), 3, false), ListIndex::Invalid);
        assert_eq!(to_list_index(&s("last"), 3, true), ListIndex::Index(3));
        assert_eq!(to_list_index(&s("all"), 3, true), ListIndex::All);
        assert_eq!(to_list_index(&s("last"), 0, true), ListIndex::Invalid);
        assert_eq!(to_list_index(&s("any"), 0, true), ListIndex::Invalid);
        assert!(matches!(
            to_list_index(&s("random"), 4, true),
            ListIndex::Index(i) if (1..=4).contains(&i)
        ));
    }
}
