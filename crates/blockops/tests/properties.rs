use std::cmp::Ordering;

use blockops::{
    InputRecord, ListIndex, RandomSource, SeededRandom, Value, compare, evaluate, evaluate_with,
    to_list_index,
};

struct PanickingSource;

impl RandomSource for PanickingSource {
    fn next_f64(&mut self) -> f64 {
        panic!("random source consulted for a degenerate range");
    }
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::Empty,
        Value::Number(0.0),
        Value::Number(-0.0),
        Value::Number(3.0),
        Value::Number(-2.5),
        Value::Number(f64::INFINITY),
        Value::Number(f64::NEG_INFINITY),
        Value::Number(f64::NAN),
        Value::from(""),
        Value::from("  "),
        Value::from("3"),
        Value::from("3.0"),
        Value::from("abc"),
        Value::from("ABC"),
        Value::from("NaN"),
        Value::from("Infinity"),
        Value::from("1e2"),
        Value::Boolean(true),
        Value::Boolean(false),
        Value::list(vec![Value::from(3)]),
        Value::list(vec![Value::from("a"), Value::from("b")]),
    ]
}

#[test]
fn compare_is_antisymmetric() {
    let values = sample_values();
    for a in &values {
        for b in &values {
            assert_eq!(compare(a, b), compare(b, a).reverse(), "{:?} vs {:?}", a, b);
        }
    }
}

#[test]
fn compare_is_transitive_for_numeric_values() {
    let numbers: Vec<Value> = [-3.5, -1.0, 0.0, 2.0, 10.0, 100.0]
        .iter()
        .flat_map(|n| [Value::Number(*n), Value::from(n.to_string())])
        .collect();
    for a in &numbers {
        for b in &numbers {
            for c in &numbers {
                if compare(a, b) != Ordering::Greater && compare(b, c) != Ordering::Greater {
                    assert_ne!(compare(a, c), Ordering::Greater, "{:?} {:?} {:?}", a, b, c);
                }
            }
        }
    }
}

#[test]
fn mod_takes_sign_of_divisor() {
    for n in [-9.0, -7.0, -0.5, 1.0, 7.0, 12.25] {
        for m in [-3.0, -1.5, 2.0, 3.0] {
            let args = InputRecord::new().with("NUM1", n).with("NUM2", m);
            let Value::Number(r) = evaluate("operator_mod", &args) else {
                panic!("mod must return a number");
            };
            assert!(r == 0.0 || r.signum() == m.signum(), "{} mod {} = {}", n, m, r);
        }
    }
    let mod_of = |n: i32, m: i32| {
        evaluate("operator_mod", &InputRecord::new().with("NUM1", n).with("NUM2", m))
    };
    assert_eq!(mod_of(-7, 3), Value::Number(2.0));
    assert_eq!(mod_of(7, -3), Value::Number(-2.0));
}

#[test]
fn list_index_accepts_exactly_one_to_length() {
    let length = 5;
    for i in 1..=length {
        assert_eq!(to_list_index(&Value::from(i as i64), length, false), ListIndex::Index(i));
    }
    for bad in [0.0, -1.0, -5.0, 0.5, 2.5, 6.0, 100.0] {
        assert_eq!(to_list_index(&Value::Number(bad), length, false), ListIndex::Invalid);
    }
}

#[test]
fn letter_of_out_of_bounds_is_empty() {
    let letter = |i: i32| {
        evaluate(
            "operator_letter_of",
            &InputRecord::new().with("STRING", "hello").with("LETTER", i),
        )
    };
    assert_eq!(letter(0), Value::from(""));
    assert_eq!(letter(6), Value::from(""));
    assert_eq!(letter(1), Value::from("h"));
}

#[test]
fn random_with_equal_bounds_is_deterministic() {
    let args = InputRecord::new().with("FROM", 1).with("TO", 1);
    assert_eq!(evaluate_with("operator_random", &args, &mut PanickingSource), Value::Number(1.0));

    let args = InputRecord::new().with("FROM", "2.5").with("TO", 2.5);
    assert_eq!(evaluate_with("operator_random", &args, &mut PanickingSource), Value::Number(2.5));
}

#[test]
fn random_integer_bounds_stay_in_range() {
    let args = InputRecord::new().with("FROM", 10).with("TO", 1);
    for _ in 0..200 {
        let Value::Number(n) = evaluate("operator_random", &args) else {
            panic!("random must return a number");
        };
        assert!((1.0..=10.0).contains(&n));
        assert_eq!(n.fract(), 0.0);
    }
}

#[test]
fn sign_of_negative_zero_is_positive_zero() {
    let args = InputRecord::new().with("OPERATOR", "sign").with("NUM", -0.0);
    let Value::Number(n) = evaluate("operator_mathop", &args) else {
        panic!("mathop must return a number");
    };
    assert_eq!(n, 0.0);
    assert!(n.is_sign_positive());
}

#[test]
fn case_insensitive_string_search() {
    let contains = evaluate(
        "operator_contains",
        &InputRecord::new().with("STRING1", "Hello World").with("STRING2", "WORLD"),
    );
    assert_eq!(contains, Value::Boolean(true));

    let index_of = |s: &str, sub: &str| {
        evaluate("operator_indexof", &InputRecord::new().with("STRING", s).with("SUBSTRING", sub))
    };
    assert_eq!(index_of("abcabc", "bc"), Value::Number(2.0));
    assert_eq!(index_of("abc", "xyz"), Value::Number(0.0));
}

#[test]
fn identical_diverges_from_equals() {
    let args = InputRecord::new().with("OPERAND1", 5).with("OPERAND2", "5");
    assert_eq!(evaluate("operator_identical", &args), Value::Boolean(false));
    assert_eq!(evaluate("operator_equals", &args), Value::Boolean(true));
}

#[test]
fn unicode_round_trips_first_character() {
    for s in ["a", "é", "€", "𝄞", "0"] {
        let codes = evaluate("operator_unicodeof", &InputRecord::new().with("STRING", s));
        let first = codes.to_string().split(' ').next().unwrap_or_default().to_string();
        let back = evaluate("operator_unicodefrom", &InputRecord::new().with("NUM", first));
        assert_eq!(back, Value::from(s));
    }
}

#[test]
fn no_operator_panics_on_odd_input() {
    let odd = sample_values();
    for spec in blockops::registry().iter() {
        for value in &odd {
            let record: InputRecord = spec.fields.iter().map(|f| (*f, value.clone())).collect();
            let _ = evaluate(spec.opcode, &record);
        }
    }
}

#[test]
fn operators_are_reentrant_across_threads() {
    let random_args = InputRecord::new().with("FROM", 1).with("TO", 6);
    let mod_args = InputRecord::new().with("NUM1", -7).with("NUM2", 3);
    let seeded_rolls = |seed: u64| -> Vec<Value> {
        let mut rng = SeededRandom::new(seed);
        (0..50)
            .map(|_| evaluate_with("operator_random", &random_args, &mut rng))
            .collect()
    };
    let expected = seeded_rolls(7);
    let shared = blockops::registry();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(std::ptr::eq(blockops::registry(), shared));
                assert!(blockops::registry().contains("operator_random"));
                for _ in 0..200 {
                    assert_eq!(evaluate("operator_mod", &mod_args), Value::Number(2.0));
                    let Value::Number(n) = evaluate("operator_random", &random_args) else {
                        panic!("random must return a number");
                    };
                    assert!((1.0..=6.0).contains(&n));
                    assert_eq!(n.fract(), 0.0);
                }
                assert_eq!(seeded_rolls(7), expected);
            });
        }
    });
}
