//! Strict-avalanche-criterion estimators.
//!
//! A single observation (Ksac) is the fraction of output bits flipped when
//! one input bit flips: `popcount(mix(x) ^ mix(y)) / W`, ideal value 0.5.
//! Scores aggregate the squared deviation from 0.5 with the streaming
//! update `mean += (x - mean) / i` (i 1-based), which needs O(1) memory and
//! avoids the drift of an unbounded running sum.
//!
//! Two sampling modes probe different input regimes: uniformly random
//! words, and a sequential low-entropy counter that exposes bias on highly
//! structured inputs (small counters) which random draws would rarely hit.

use crate::arith;
use crate::mixer;
use crate::prng::Xoroshiro128Plus;

/// Scores candidate multipliers. Owns the random stream and the
/// low-entropy sampling counter; both advance only through this API.
#[derive(Debug, Clone)]
pub struct AvalancheEvaluator {
    width: u32,
    rng: Xoroshiro128Plus,
    /// Sequential counter for the low-entropy mode. Initialized from one
    /// random draw, then only ever incremented.
    counter: u64,
}

impl AvalancheEvaluator {
    pub fn new(width: u32, mut rng: Xoroshiro128Plus) -> Self {
        assert!(width >= 2 && width <= 64 && width % 2 == 0, "width must be even, 2..=64");
        let counter = rng.next_word(width);
        Self { width, rng, counter }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Fresh random odd multiplier drawn from the evaluator's stream.
    pub fn random_odd_multiplier(&mut self) -> u64 {
        self.rng.next_odd(self.width)
    }

    /// Single-sample avalanche coefficient for the pair (x, y) under
    /// multiplier m. Always in [0, 1].
    pub fn ksac(&self, x: u64, y: u64, m: u64) -> f64 {
        let diff = mixer::mix(x, m, self.width) ^ mixer::mix(y, m, self.width);
        diff.count_ones() as f64 / self.width as f64
    }

    /// Ksac for a uniformly random input and one random flipped bit.
    pub fn random_ksac(&mut self, m: u64) -> f64 {
        let x = self.rng.next_word(self.width);
        let y = self.rng.flip_random_bit(x, self.width);
        self.ksac(x, y, m)
    }

    /// Ksac for the next value of the sequential counter and one random
    /// flipped bit.
    pub fn low_entropy_ksac(&mut self, m: u64) -> f64 {
        self.counter = self.counter.wrapping_add(1) & arith::word_mask(self.width);
        let x = self.counter;
        let y = self.rng.flip_random_bit(x, self.width);
        self.ksac(x, y, m)
    }

    /// Full avalanche criterion at one fixed input: flip each of the W bit
    /// positions in turn (deterministic) and return the mean squared
    /// deviation of the W Ksac values from 0.5. In [0, 0.25].
    pub fn fsac_error(&self, x: u64, m: u64) -> f64 {
        let mut mean = 0.0;
        for bit in 0..self.width {
            let error = self.ksac(x, x ^ (1u64 << bit), m) - 0.5;
            mean += (error * error - mean) / (bit + 1) as f64;
        }
        mean
    }

    /// Combined score: n random-input Ksac samples then n low-entropy Ksac
    /// samples, squared deviations folded into one running mean (i = 1..2n
    /// across both phases). Lower is closer to the strict avalanche
    /// criterion on both ordinary and structured inputs.
    pub fn combined_ksac_mse(&mut self, m: u64, n: usize) -> f64 {
        let mut mean = 0.0;
        let mut count = 0usize;
        for _ in 0..n {
            let error = self.random_ksac(m) - 0.5;
            count += 1;
            mean += (error * error - mean) / count as f64;
        }
        for _ in 0..n {
            let error = self.low_entropy_ksac(m) - 0.5;
            count += 1;
            mean += (error * error - mean) / count as f64;
        }
        mean
    }

    /// Combined full-avalanche error: n Fsac sweeps at random inputs then n
    /// at sequential counter values, folded into one running mean.
    pub fn combined_fsac_error(&mut self, m: u64, n: usize) -> f64 {
        let mask = arith::word_mask(self.width);
        let mut mean = 0.0;
        let mut count = 0usize;
        for _ in 0..n {
            let x = self.rng.next_word(self.width);
            count += 1;
            mean += (self.fsac_error(x, m) - mean) / count as f64;
        }
        for _ in 0..n {
            self.counter = self.counter.wrapping_add(1) & mask;
            let x = self.counter;
            count += 1;
            mean += (self.fsac_error(x, m) - mean) / count as f64;
        }
        mean
    }
}
