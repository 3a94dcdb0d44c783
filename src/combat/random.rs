//! Random number sources
//!
//! Every draw the combat system makes goes through [`RandomSource`], so a
//! battle can run on real entropy, on a fixed seed, or on a scripted sequence
//! of values.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform integers in an inclusive range
pub trait RandomSource {
    /// Draw a uniform integer in `[lo, hi]`
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        (**self).range_inclusive(lo, hi)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        (**self).range_inclusive(lo, hi)
    }
}

/// Random source backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl RngSource<StdRng> {
    /// Seed from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible source for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RngSource<R> {
    /// Wrap an existing generator
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

/// What a [`ScriptedRandom`] yields once its queue is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exhausted {
    Max,
    Min,
}

/// Replays a fixed list of values
///
/// Each value is clamped into the range requested by the caller. When the
/// queue runs dry the source keeps answering with the upper bound of the
/// range (or the lower bound, for [`ScriptedRandom::always_min`]).
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<i32>,
    exhausted: Exhausted,
}

impl ScriptedRandom {
    /// Replay `values` in order, then fall back to the maximum of each range
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            exhausted: Exhausted::Max,
        }
    }

    /// Every draw is the top of its range: natural 20s and maximum damage
    pub fn always_max() -> Self {
        Self::new([])
    }

    /// Every draw is the bottom of its range: natural 1s and minimum damage
    pub fn always_min() -> Self {
        Self {
            values: VecDeque::new(),
            exhausted: Exhausted::Min,
        }
    }

    /// Number of scripted values not yet consumed
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        match self.values.pop_front() {
            Some(v) => v.clamp(lo, hi.max(lo)),
            None => match self.exhausted {
                Exhausted::Max => hi.max(lo),
                Exhausted::Min => lo,
            },
        }
    }
}
