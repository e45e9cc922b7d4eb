//! A HyperLogLog whose buckets also keep a MinHash-style minimum.
//!
//! One hash per item drives both halves: the bucket index picks the slot, the
//! windowed remainder feeds the register (leading zeros) and the minimum
//! (raw value). Cardinality comes from the registers, similarity from how many
//! buckets hold the same minimum.

use crate::error::Result;
use crate::hash::Hash32;
use crate::registers::{self, bucket, check_precision, check_same_precision, rank};

/// HyperLogLog registers paired with a per-bucket minimum hash, estimating
/// both cardinality and Jaccard similarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HllMinHash {
    registers: Box<[u8]>,
    min_values: Box<[u32]>,
    p: u8,
}

impl HllMinHash {
    /// Creates an empty sketch with `2^p` buckets, `p` in {4, ..., 16}.
    pub fn new(p: u8) -> Result<Self> {
        check_precision(p)?;
        let m = 1usize << p;
        Ok(Self {
            registers: vec![0; m].into_boxed_slice(),
            min_values: vec![u32::MAX; m].into_boxed_slice(),
            p,
        })
    }

    pub fn precision(&self) -> u8 {
        self.p
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn min_values(&self) -> &[u32] {
        &self.min_values
    }

    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    pub fn clear(&mut self) {
        self.registers.fill(0);
        self.min_values.fill(u32::MAX);
    }

    pub fn add<H: Hash32>(&mut self, item: H) -> &mut Self {
        let (j, w) = bucket(item.hash32(), self.p);

        let r = rank(w);
        if r > self.registers[j] {
            self.registers[j] = r;
        }

        if w < self.min_values[j] {
            self.min_values[j] = w;
        }
        self
    }

    /// Registers merge by maximum, minimums by minimum.
    pub fn merge(&mut self, other: &HllMinHash) -> Result<&mut Self> {
        check_same_precision(self.p, other.p)?;
        registers::merge_max(&mut self.registers, &other.registers);
        for (v, &o) in self.min_values.iter_mut().zip(other.min_values.iter()) {
            if o < *v {
                *v = o;
            }
        }
        Ok(self)
    }

    /// Bias-corrected cardinality estimate, identical to [`HyperLogLog::count`](crate::HyperLogLog::count).
    pub fn count(&self) -> f64 {
        registers::estimate(&self.registers)
    }

    /// Fraction of buckets in which both sketches hold the same minimum.
    pub fn jaccard(&self, other: &HllMinHash) -> Result<f64> {
        check_same_precision(self.p, other.p)?;
        let agree = self
            .min_values
            .iter()
            .zip(other.min_values.iter())
            .filter(|(a, b)| a == b)
            .count();
        Ok(agree as f64 / self.min_values.len() as f64)
    }

    /// Estimated intersection size: the similarity applied to the union cardinality.
    pub fn intersection(&self, other: &HllMinHash) -> Result<f64> {
        let similarity = self.jaccard(other)?;
        let mut union = self.registers.to_vec();
        registers::merge_max(&mut union, &other.registers);
        Ok(similarity * registers::estimate(&union))
    }
}
