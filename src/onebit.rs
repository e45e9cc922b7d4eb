//! One-bit MinHash: the lowest bit of each MinHash value.
//!
//! Trades estimation precision for a 32x smaller signature. Works best when
//! the sets being compared are already fairly similar (Jaccard above 0.5).

use crate::bitops::pop_count128;
use crate::error::{Result, SketchError};
use crate::minhash::MinHash;

/// Maximum number of exported bits.
pub const ONE_BIT_CAPACITY: usize = 128;

/// A read-only one-bit signature exported from a [`MinHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneBitMinHash {
    size: usize,
    bits: u128,
    seed: i64,
}

impl OneBitMinHash {
    /// Bit `i` is the lowest bit of hash value `i`. Signatures with more than
    /// [`ONE_BIT_CAPACITY`] permutations export only the first ones.
    pub fn export(sig: &MinHash) -> Self {
        let size = sig.num_perm().min(ONE_BIT_CAPACITY);
        let bits = sig.hash_values()[..size]
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, &v)| acc | (((v & 1) as u128) << i));
        Self {
            size,
            bits,
            seed: sig.seed(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn bits(&self) -> u128 {
        self.bits
    }
}

impl From<&MinHash> for OneBitMinHash {
    fn from(sig: &MinHash) -> Self {
        Self::export(sig)
    }
}

/// Estimates the Jaccard similarity among two or more one-bit signatures.
///
/// Unrelated bits agree half of the time, so the raw agreement fraction is
/// rescaled from `[0.5, 1]` onto `[0, 1]`. Disagreement beyond chance gives a
/// negative estimate.
pub fn jaccard(sigs: &[&OneBitMinHash]) -> Result<f64> {
    if sigs.len() < 2 {
        return Err(SketchError::InvalidArgument(
            "less than 2 OneBitMinHash signatures were given".to_string(),
        ));
    }
    let head = sigs[0];
    for sig in &sigs[1..] {
        if head.seed != sig.seed {
            tracing::warn!(
                seed = head.seed,
                other_seed = sig.seed,
                "rejecting one-bit signatures with different seeds"
            );
            return Err(SketchError::IncompatibleSketch(
                "cannot compare OneBitMinHash signatures with different seed".to_string(),
            ));
        }
        if head.size != sig.size {
            tracing::warn!(
                size = head.size,
                other_size = sig.size,
                "rejecting one-bit signatures with different sizes"
            );
            return Err(SketchError::IncompatibleSketch(
                "cannot compare OneBitMinHash signatures with different numbers of permutations"
                    .to_string(),
            ));
        }
    }
    let common_bits = sigs.iter().fold(0u128, |acc, sig| acc ^ sig.bits);
    let size = head.size as f64;
    let agree = (size - pop_count128(common_bits) as f64) / size;
    Ok(2.0 * (agree - 0.5))
}
