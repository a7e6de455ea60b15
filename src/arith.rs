//! Word-level arithmetic for odd multipliers modulo 2^W.

use crate::HuntError;

/// All-ones mask for a `width`-bit word, `width` in 1..=64.
#[inline]
pub fn word_mask(width: u32) -> u64 {
    debug_assert!(width >= 1 && width <= 64);
    if width == 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Force the low bit: only odd integers are invertible modulo 2^W.
#[inline]
pub fn make_odd(x: u64) -> u64 {
    x | 1
}

/// Modular multiplicative inverse of odd `m` modulo 2^width, by Hensel
/// lifting: a closed-form 4-bit-correct seed from the low nibble, then
/// Newton doubling `x = x * (2 - m*x)`, each step doubling the number of
/// correct low bits (4 -> 8 -> 16 -> 32 -> 64).
pub fn mod_inverse(m: u64, width: u32) -> Result<u64, HuntError> {
    if m & 1 == 0 {
        return Err(HuntError::NonInvertibleMultiplier(m, width));
    }
    let mut x = (((m.wrapping_add(2)) & 4) << 1).wrapping_add(m);
    for _ in 0..4 {
        x = x.wrapping_mul(2u64.wrapping_sub(m.wrapping_mul(x)));
    }
    Ok(x & word_mask(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Xoroshiro128Plus;

    fn mul_mod(a: u64, b: u64, width: u32) -> u64 {
        a.wrapping_mul(b) & word_mask(width)
    }

    #[test]
    fn test_inverse_of_three() {
        let inv = mod_inverse(3, 64).unwrap();
        assert_eq!(inv, 0xAAAA_AAAA_AAAA_AAAB);
        assert_eq!(mul_mod(3, inv, 64), 1);
    }

    #[test]
    fn test_inverse_known_pair() {
        // Multiplier/inverse pair published with the original finalizer.
        let inv = mod_inverse(0x0CF3_FD1B_9997_F637, 64).unwrap();
        assert_eq!(inv, 0xAFC1_5306_8017_9F87);
    }

    #[test]
    fn test_inverse_random_odd() {
        let mut rng = Xoroshiro128Plus::from_seed(7);
        for _ in 0..1000 {
            let m = make_odd(rng.next_u64());
            let inv = mod_inverse(m, 64).unwrap();
            assert_eq!(mul_mod(m, inv, 64), 1, "m * inverse(m) != 1 for m = {:#x}", m);
        }
    }

    #[test]
    fn test_inverse_narrow_widths() {
        for &width in &[8u32, 16, 32] {
            let mut rng = Xoroshiro128Plus::from_seed(width as u64);
            for _ in 0..200 {
                let m = make_odd(rng.next_u64()) & word_mask(width);
                let inv = mod_inverse(m, width).unwrap();
                assert_eq!(mul_mod(m, inv, width), 1, "width {} m {:#x}", width, m);
            }
        }
    }

    #[test]
    fn test_inverse_rejects_even() {
        assert!(matches!(
            mod_inverse(6, 64),
            Err(HuntError::NonInvertibleMultiplier(6, 64))
        ));
    }

    #[test]
    fn test_make_odd() {
        assert_eq!(make_odd(0), 1);
        assert_eq!(make_odd(4), 5);
        assert_eq!(make_odd(5), 5);
    }

    #[test]
    fn test_word_mask() {
        assert_eq!(word_mask(64), u64::MAX);
        assert_eq!(word_mask(32), 0xFFFF_FFFF);
        assert_eq!(word_mask(16), 0xFFFF);
    }
}
