//! Uniform random sources used by `operator_random` and keyword list indices.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cast;
use crate::value::Value;

/// Source of uniform doubles in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Default source: the thread-local generator from `rand`, so concurrent
/// evaluations never contend on a shared lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Deterministic source for reproducible runs.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Pick a value between two bounds, inclusive.
///
/// Both bounds integral (see [`cast::is_int`]) gives an integer result,
/// otherwise a continuous one. Equal bounds return immediately without
/// touching `rng`.
pub fn random_between(from: &Value, to: &Value, rng: &mut dyn RandomSource) -> f64 {
    let n_from = cast::to_number(from);
    let n_to = cast::to_number(to);
    let (low, high) = if n_from <= n_to {
        (n_from, n_to)
    } else {
        (n_to, n_from)
    };
    if low == high {
        return low;
    }
    if cast::is_int(from) && cast::is_int(to) {
        return low + (rng.next_f64() * ((high + 1.0) - low)).floor();
    }
    rng.next_f64() * (high - low) + low
}
