//! Bucket routing and the bias-corrected cardinality estimator shared by
//! [`HyperLogLog`](crate::HyperLogLog) and [`HllMinHash`](crate::HllMinHash).

use crate::bitops::{alpha, count_zeros, extract_bits, leading_zero_count32};
use crate::error::{Result, SketchError};

/// Smallest accepted precision parameter.
pub const MIN_PRECISION: u8 = 4;
/// Largest accepted precision parameter.
pub const MAX_PRECISION: u8 = 16;

const TWO_32: f64 = (1u64 << 32) as f64;

pub(crate) fn check_precision(p: u8) -> Result<()> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&p) {
        return Err(SketchError::InvalidArgument(format!(
            "precision must be between {MIN_PRECISION} and {MAX_PRECISION}, got {p}"
        )));
    }
    Ok(())
}

pub(crate) fn check_same_precision(p: u8, other_p: u8) -> Result<()> {
    if p != other_p {
        tracing::warn!(p, other_p, "rejecting sketches with different precisions");
        return Err(SketchError::IncompatibleSketch(format!(
            "precisions must be equal, got {p} and {other_p}"
        )));
    }
    Ok(())
}

/// Splits a hash into its bucket index (top `p` bits) and the windowed rest.
///
/// The window carries a guard bit at position `p - 1`, so it is never zero and
/// its leading-zero count is at most `32 - p`.
#[inline]
pub(crate) fn bucket(hash: u32, p: u8) -> (usize, u32) {
    let j = extract_bits(hash, 32, 32 - p) as usize;
    let w = (hash << p) | (1 << (p - 1));
    (j, w)
}

/// Register value contributed by a windowed hash.
#[inline]
pub(crate) fn rank(w: u32) -> u8 {
    leading_zero_count32(w) + 1
}

pub(crate) fn merge_max(registers: &mut [u8], other: &[u8]) {
    for (r, &o) in registers.iter_mut().zip(other) {
        if o > *r {
            *r = o;
        }
    }
}

fn raw_estimate(registers: &[u8]) -> f64 {
    let sum: f64 = registers
        .iter()
        .map(|&r| 2f64.powi(-(r as i32)))
        .sum();
    let m = registers.len() as f64;
    alpha(registers.len() as u32) * m * m / sum
}

/// Cardinality estimate over a register array, with small- and large-range correction.
pub(crate) fn estimate(registers: &[u8]) -> f64 {
    let est = raw_estimate(registers);
    let m = registers.len() as f64;
    if est <= 2.5 * m {
        let zeros = count_zeros(registers);
        if zeros != 0 {
            // linear counting
            return m * (m / zeros as f64).ln();
        }
        est
    } else if est < TWO_32 / 30.0 {
        est
    } else {
        -TWO_32 * (1.0 - est / TWO_32).ln()
    }
}
