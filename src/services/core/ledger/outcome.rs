// src/services/core/ledger/outcome.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Result of a coin flip, seen from the member who placed the wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flip {
    Win,
    Loss,
}

/// Randomness consumed by wagers and reward claims.
pub trait OutcomeSource {
    /// Uniform draw from {win, loss}.
    fn flip(&mut self) -> Flip;

    /// Uniform integer in `[min, max]`. Callers guarantee `min <= max`.
    fn draw(&mut self, min: i64, max: i64) -> i64;
}

/// `OutcomeSource` backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomOutcomes<R> {
    rng: R,
}

impl<R: Rng> RandomOutcomes<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomOutcomes<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> OutcomeSource for RandomOutcomes<R> {
    fn flip(&mut self) -> Flip {
        if self.rng.gen_bool(0.5) {
            Flip::Win
        } else {
            Flip::Loss
        }
    }

    fn draw(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }
}

/// Always produces the same flip, and the same reward clamped into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOutcomes {
    flip: Flip,
    draw: Option<i64>,
}

impl FixedOutcomes {
    pub fn always(flip: Flip) -> Self {
        Self { flip, draw: None }
    }

    pub fn with_draw(mut self, value: i64) -> Self {
        self.draw = Some(value);
        self
    }
}

impl OutcomeSource for FixedOutcomes {
    fn flip(&mut self) -> Flip {
        self.flip
    }

    fn draw(&mut self, min: i64, max: i64) -> i64 {
        self.draw.map_or(min, |value| value.clamp(min, max))
    }
}
