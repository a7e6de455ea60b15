//! Deterministic pseudo-random source: xoroshiro128+ with splitmix64 seed
//! expansion.
//!
//! xoroshiro128+ has 128 bits of state, 64-bit output, and period 2^128 - 1;
//! the all-zero state is the one fixed point of the transition function and
//! must never be entered. Seeding therefore either expands a single 64-bit
//! seed through splitmix64 (so small seeds do not land near the fixed
//! point) or draws two raw words from an entropy capability and rejects an
//! all-zero result.

use crate::arith;
use crate::entropy::EntropySource;
use crate::HuntError;

/// Splitmix64: tiny 64-bit-state generator used only to expand seeds.
#[derive(Debug, Clone, Copy)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Number of fresh entropy draws attempted before an all-zero state is
/// reported as degenerate rather than retried.
const SEED_RETRIES: u32 = 4;

/// xoroshiro128+ generator.
#[derive(Debug, Clone, Copy)]
pub struct Xoroshiro128Plus {
    s0: u64,
    s1: u64,
}

impl Xoroshiro128Plus {
    /// Deterministic construction from a single 64-bit seed, expanded
    /// through splitmix64 so weak seeds still fill both state words.
    pub fn from_seed(seed: u64) -> Self {
        let mut sm = SplitMix64::new(seed);
        let s0 = sm.next_u64();
        let s1 = sm.next_u64();
        if s0 | s1 == 0 {
            // No 64-bit seed expands to (0, 0); the nonzero invariant is
            // still enforced unconditionally.
            return Self { s0: 0x9E37_79B9_7F4A_7C15, s1: 0 };
        }
        Self { s0, s1 }
    }

    /// Seed directly from two raw entropy words, retrying on an all-zero
    /// result before giving up with `DegenerateSeed`. Entropy failure is
    /// surfaced as-is.
    pub fn from_entropy(source: &mut dyn EntropySource) -> Result<Self, HuntError> {
        for _ in 0..SEED_RETRIES {
            let s0 = source.next_u64()?;
            let s1 = source.next_u64()?;
            if s0 | s1 != 0 {
                return Ok(Self { s0, s1 });
            }
        }
        Err(HuntError::DegenerateSeed)
    }

    /// Next 64-bit output: the pre-update sum of the state words.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.s0;
        let mut s1 = self.s1;
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.s0 = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.s1 = s1.rotate_left(36);

        result
    }

    /// Advance the state as if `next_u64` had been called 2^64 times.
    /// Generates non-overlapping substreams for parallel extensions; the
    /// serial optimizer itself does not call this.
    pub fn jump(&mut self) {
        const JUMP: [u64; 2] = [0xBEAC_0467_EBA5_FACB, 0xD86B_048B_86AA_9922];

        let mut s0 = 0u64;
        let mut s1 = 0u64;
        for word in JUMP {
            for bit in 0..64 {
                if word & (1u64 << bit) != 0 {
                    s0 ^= self.s0;
                    s1 ^= self.s1;
                }
                self.next_u64();
            }
        }
        self.s0 = s0;
        self.s1 = s1;
    }

    /// Uniform value over the full `width`-bit range.
    #[inline]
    pub fn next_word(&mut self, width: u32) -> u64 {
        self.next_u64() & arith::word_mask(width)
    }

    /// Uniform bit index in [0, width). Exact for the power-of-two widths
    /// used here since 2^64 is a multiple of the width.
    #[inline]
    pub fn bit_index(&mut self, width: u32) -> u32 {
        (self.next_u64() % width as u64) as u32
    }

    /// Xor `x` with a single randomly chosen bit mask below `width`.
    #[inline]
    pub fn flip_random_bit(&mut self, x: u64, width: u32) -> u64 {
        x ^ (1u64 << self.bit_index(width))
    }

    /// Fresh random odd `width`-bit integer (candidate multiplier).
    #[inline]
    pub fn next_odd(&mut self, width: u32) -> u64 {
        arith::make_odd(self.next_word(width))
    }

    /// True only in the degenerate all-zero (fixed-point) state.
    pub fn is_degenerate(&self) -> bool {
        self.s0 | self.s1 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<u64>);
    impl EntropySource for Fixed {
        fn next_u64(&mut self) -> Result<u64, HuntError> {
            if self.0.is_empty() {
                Err(HuntError::EntropyUnavailable("exhausted".into()))
            } else {
                Ok(self.0.remove(0))
            }
        }
    }

    #[test]
    fn test_splitmix_reference_vector() {
        // First outputs of splitmix64 from seed 0, per the reference
        // implementation.
        let mut sm = SplitMix64::new(0);
        assert_eq!(sm.next_u64(), 0xE220_A839_7B1D_CDAF);
        assert_eq!(sm.next_u64(), 0x6E78_9E6A_A1B9_65F4);
        assert_eq!(sm.next_u64(), 0x06C4_5D18_8009_454F);
    }

    #[test]
    fn test_first_output_is_state_sum() {
        let mut rng = Xoroshiro128Plus { s0: 1, s1: 2 };
        assert_eq!(rng.next_u64(), 3);
    }

    #[test]
    fn test_from_seed_deterministic() {
        let mut a = Xoroshiro128Plus::from_seed(42);
        let mut b = Xoroshiro128Plus::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_weak_seed_expands_away_from_fixed_point() {
        for seed in [0u64, 1, 2, u64::MAX] {
            let rng = Xoroshiro128Plus::from_seed(seed);
            assert!(!rng.is_degenerate(), "seed {} expanded to zero state", seed);
        }
    }

    #[test]
    fn test_zero_state_unreachable() {
        // State 0 is a fixed point; from a nonzero start no finite prefix
        // of next() calls may reach it.
        let mut rng = Xoroshiro128Plus::from_seed(0xDEAD_BEEF);
        for i in 0..100_000 {
            rng.next_u64();
            assert!(!rng.is_degenerate(), "reached zero state after {} draws", i + 1);
        }
    }

    #[test]
    fn test_from_entropy_uses_raw_words() {
        let mut src = Fixed(vec![11, 22]);
        let mut rng = Xoroshiro128Plus::from_entropy(&mut src).unwrap();
        assert_eq!(rng.next_u64(), 33);
    }

    #[test]
    fn test_from_entropy_retries_zero_state() {
        let mut src = Fixed(vec![0, 0, 5, 6]);
        let rng = Xoroshiro128Plus::from_entropy(&mut src).unwrap();
        assert!(!rng.is_degenerate());
    }

    #[test]
    fn test_from_entropy_degenerate_after_retries() {
        let mut src = Fixed(vec![0; 2 * SEED_RETRIES as usize]);
        assert!(matches!(
            Xoroshiro128Plus::from_entropy(&mut src),
            Err(HuntError::DegenerateSeed)
        ));
    }

    #[test]
    fn test_from_entropy_propagates_unavailable() {
        let mut src = Fixed(vec![]);
        assert!(matches!(
            Xoroshiro128Plus::from_entropy(&mut src),
            Err(HuntError::EntropyUnavailable(_))
        ));
    }

    #[test]
    fn test_jump_decorrelates_streams() {
        let mut base = Xoroshiro128Plus::from_seed(9);
        let mut jumped = Xoroshiro128Plus::from_seed(9);
        jumped.jump();

        let a: Vec<u64> = (0..16).map(|_| base.next_u64()).collect();
        let b: Vec<u64> = (0..16).map(|_| jumped.next_u64()).collect();
        assert_ne!(a, b, "jumped stream should not track the base stream");

        // jump() is a pure function of the state.
        let mut jumped2 = Xoroshiro128Plus::from_seed(9);
        jumped2.jump();
        let c: Vec<u64> = (0..16).map(|_| jumped2.next_u64()).collect();
        assert_eq!(b, c);
    }

    #[test]
    fn test_bit_index_in_range() {
        let mut rng = Xoroshiro128Plus::from_seed(3);
        for &width in &[16u32, 32, 64] {
            for _ in 0..500 {
                assert!(rng.bit_index(width) < width);
            }
        }
    }

    #[test]
    fn test_flip_random_bit_flips_exactly_one() {
        let mut rng = Xoroshiro128Plus::from_seed(4);
        for _ in 0..500 {
            let x = rng.next_u64();
            let y = rng.flip_random_bit(x, 64);
            assert_eq!((x ^ y).count_ones(), 1);
        }
    }

    #[test]
    fn test_next_odd_is_odd_and_in_width() {
        let mut rng = Xoroshiro128Plus::from_seed(5);
        for _ in 0..500 {
            let m = rng.next_odd(32);
            assert_eq!(m & 1, 1);
            assert!(m <= arith::word_mask(32));
        }
    }
}
