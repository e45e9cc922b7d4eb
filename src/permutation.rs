//! Universal hashing permutations used to simulate independent hash functions
//! from a single 32-bit base hash.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mersenne prime `2^61 - 1`.
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// One permutation `x -> ((a * x + b) mod p) mod 2^32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permutation {
    a: u32,
    b: u32,
}

impl Permutation {
    /// `a` must be nonzero, otherwise every input maps to `b`.
    pub fn new(a: u32, b: u32) -> Self {
        debug_assert!(a != 0, "permutation multiplier must be nonzero");
        Self { a, b }
    }

    #[inline]
    pub fn apply(&self, x: u32) -> u32 {
        // (2^32 - 1)^2 + (2^32 - 1) < 2^64, so the affine step cannot overflow.
        let v = self.a as u64 * x as u64 + self.b as u64;
        (v % MERSENNE_PRIME) as u32
    }

    pub fn a(&self) -> u32 {
        self.a
    }

    pub fn b(&self) -> u32 {
        self.b
    }
}

/// Deterministically derives `count` permutations from `seed`.
///
/// Each call owns its generator, so the same `(seed, count)` always yields the
/// same permutations and a shorter list is a prefix of a longer one.
pub fn create_permutations(seed: i64, count: usize) -> Vec<Permutation> {
    tracing::trace!(seed, count, "creating permutations");
    let mut rng = StdRng::seed_from_u64(seed as u64);
    (0..count)
        .map(|_| {
            let a = loop {
                let a: u32 = rng.gen();
                if a != 0 {
                    break a;
                }
            };
            let b: u32 = rng.gen();
            Permutation::new(a, b)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_permutations() {
        let p1 = create_permutations(42, 64);
        let p2 = create_permutations(42, 64);
        assert_eq!(p1, p2);

        let p3 = create_permutations(43, 64);
        assert_ne!(p1, p3);
    }

    #[test]
    fn test_shorter_is_prefix() {
        let long = create_permutations(-7, 32);
        let short = create_permutations(-7, 8);
        assert_eq!(&long[..8], &short[..]);
    }

    #[test]
    fn test_multiplier_nonzero() {
        for seed in 0..16 {
            assert!(create_permutations(seed, 256).iter().all(|p| p.a() != 0));
        }
    }

    #[test]
    fn test_apply_uses_wide_arithmetic() {
        let p = Permutation::new(u32::MAX, u32::MAX);
        let expected = ((u32::MAX as u128 * u32::MAX as u128 + u32::MAX as u128)
            % MERSENNE_PRIME as u128) as u32;
        assert_eq!(p.apply(u32::MAX), expected);

        let identity = Permutation::new(1, 0);
        assert_eq!(identity.apply(12345), 12345);
    }
}
