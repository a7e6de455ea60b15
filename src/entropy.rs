//! Raw operating-system entropy behind a pluggable capability trait.
//!
//! The core never touches a specific OS seeding facility directly; it only
//! consumes `EntropySource`. The default backend wraps `rand`'s `OsRng`.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::HuntError;

/// Supplies raw uniformly distributed words on demand. Failure to supply
/// entropy is fatal to seeding.
pub trait EntropySource {
    /// One uniformly distributed 64-bit word.
    fn next_u64(&mut self) -> Result<u64, HuntError>;

    /// One uniformly distributed 32-bit word.
    fn next_u32(&mut self) -> Result<u32, HuntError> {
        Ok((self.next_u64()? >> 32) as u32)
    }
}

/// Operating-system entropy via `OsRng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u64(&mut self) -> Result<u64, HuntError> {
        let mut buf = [0u8; 8];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| HuntError::EntropyUnavailable(e.to_string()))?;
        Ok(u64::from_le_bytes(buf))
    }
}
