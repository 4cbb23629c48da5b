//! Seedable randomness for the simulation.
//!
//! Every random draw in the grow cycle (event rolls, damage, optimal light,
//! pollination, seed options) goes through [`GrowRng`], so a seeded
//! [`FastRng`] or a [`ScriptedRng`] replays a cycle exactly.

use std::collections::VecDeque;

/// Source of uniform random numbers.
pub trait GrowRng: Send {
    /// Generate a random f64 in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Returns true with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Generate an integer in [0, n). Returns 0 when `n` is 0.
    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// Generate an integer in [min, max]. Bounds may be given in either order.
    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let span = (hi - lo) as usize + 1;
        lo + self.below(span) as u32
    }

    /// Generate a random f64 in [min, max).
    fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// Production generator backed by `fastrand`.
#[derive(Debug, Clone)]
pub struct FastRng {
    inner: fastrand::Rng,
}

impl Default for FastRng {
    fn default() -> Self {
        Self::new()
    }
}

impl FastRng {
    /// Create a generator seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: fastrand::Rng::new(),
        }
    }

    /// Create a generator with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: fastrand::Rng::with_seed(seed),
        }
    }

    /// Create a seeded generator when a seed is given, otherwise from entropy.
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::with_seed)
    }
}

impl GrowRng for FastRng {
    fn next_f64(&mut self) -> f64 {
        self.inner.f64()
    }
}

/// Replays a fixed list of draws, then repeats `fallback` forever.
///
/// Used to force specific outcomes (a pest that is not repelled, a
/// particular damage roll) in tests and recorded replays.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRng {
    /// Create a scripted generator. Values are clamped into [0.0, 1.0).
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().map(clamp_unit).collect(),
            fallback: clamp_unit(fallback),
        }
    }

    /// Generator that always returns `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }

    /// Queue more draws after the ones already scripted.
    pub fn push(&mut self, draws: impl IntoIterator<Item = f64>) {
        self.draws.extend(draws.into_iter().map(clamp_unit));
    }

    /// Number of scripted draws not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl GrowRng for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0 - f64::EPSILON)
}

/// Pick a uniformly random element. Returns `None` for an empty slice.
pub fn pick<'a, T>(items: &'a [T], rng: &mut dyn GrowRng) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.below(items.len()))
    }
}

/// Shuffle `items` in place with Fisher-Yates.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn GrowRng) {
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}
