//! HyperLogLog cardinality sketch.
//!
//! See Flajolet et al., "HyperLogLog: the analysis of a near-optimal
//! cardinality estimation algorithm". Set similarity between sketches is
//! derived from the inclusion-exclusion principle.

use crate::error::{Result, SketchError};
use crate::hash::Hash32;
use crate::registers::{self, bucket, check_precision, check_same_precision, rank};

/// HyperLogLog sketch with `2^p` one-byte registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperLogLog {
    registers: Box<[u8]>,
    p: u8,
}

impl HyperLogLog {
    /// Creates an empty sketch with precision `p`.
    ///
    /// The precision parameter `p` must be in the range {4, 5, ..., 15, 16}.
    /// It defines the register count `2^p` and with it the standard error,
    /// roughly `1.04 / sqrt(2^p)`.
    pub fn new(p: u8) -> Result<Self> {
        check_precision(p)?;
        Ok(Self {
            registers: vec![0; 1 << p].into_boxed_slice(),
            p,
        })
    }

    /// Returns a sketch whose registers are the given bytes.
    ///
    /// The length must be `2^p` for a valid precision. Registers that were
    /// not produced by a sketch of the same precision give meaningless estimates.
    pub fn wrap(registers: Vec<u8>) -> Result<Self> {
        let len = registers.len();
        if !len.is_power_of_two() {
            return Err(SketchError::InvalidArgument(format!(
                "register count {len} is not a power of two"
            )));
        }
        let p = len.trailing_zeros() as u8;
        check_precision(p)?;
        Ok(Self {
            registers: registers.into_boxed_slice(),
            p,
        })
    }

    pub fn precision(&self) -> u8 {
        self.p
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    /// Resets this sketch to its initial state representing an empty set.
    pub fn clear(&mut self) {
        self.registers.fill(0);
    }

    /// Adds an item, represented by its 32-bit hash, to this sketch.
    ///
    /// In order to get good estimates, it is important that the hash value is
    /// calculated using a high-quality hash algorithm.
    pub fn add<H: Hash32>(&mut self, item: H) -> &mut Self {
        let (j, w) = bucket(item.hash32(), self.p);
        let r = rank(w);
        if r > self.registers[j] {
            self.registers[j] = r;
        }
        self
    }

    /// Folds `other` into this sketch. Both must share the same precision.
    pub fn merge(&mut self, other: &HyperLogLog) -> Result<&mut Self> {
        check_same_precision(self.p, other.p)?;
        registers::merge_max(&mut self.registers, &other.registers);
        Ok(self)
    }

    /// Returns the bias-corrected cardinality estimate.
    pub fn count(&self) -> f64 {
        registers::estimate(&self.registers)
    }

    /// Cardinality of the union with `other`, without modifying either sketch.
    pub fn union(&self, other: &HyperLogLog) -> Result<f64> {
        union_count(&[self, other])
    }

    /// Encoded size: one precision byte followed by the registers.
    pub fn byte_size(&self) -> usize {
        1 + self.registers.len()
    }

    /// Writes the precision and registers into the front of `buffer`.
    pub fn serialize(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.byte_size();
        if buffer.len() < needed {
            return Err(SketchError::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }
        self.write_blob(&mut buffer[..needed]);
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0; self.byte_size()];
        self.write_blob(&mut buffer);
        buffer
    }

    // `blob` is exactly `byte_size()` long.
    fn write_blob(&self, blob: &mut [u8]) {
        blob[0] = self.p;
        blob[1..].copy_from_slice(&self.registers);
    }

    /// Reads a blob written by [`HyperLogLog::serialize`].
    pub fn deserialize(buffer: &[u8]) -> Result<Self> {
        let Some(&p) = buffer.first() else {
            tracing::warn!("empty hyperloglog blob");
            return Err(SketchError::TruncatedBuffer {
                needed: 1,
                actual: 0,
            });
        };
        check_precision(p)?;
        let needed = 1 + (1usize << p);
        if buffer.len() < needed {
            tracing::warn!(len = buffer.len(), needed, "truncated hyperloglog blob");
            return Err(SketchError::TruncatedBuffer {
                needed,
                actual: buffer.len(),
            });
        }
        tracing::debug!(p, "deserialized hyperloglog");
        Ok(Self {
            registers: buffer[1..needed].into(),
            p,
        })
    }

    #[cfg(feature = "serde")]
    /// Writes the sketch with bincode; requires the `serde` feature.
    pub fn save<W: std::io::Write>(&self, mut writer: W) -> std::io::Result<()> {
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    #[cfg(feature = "serde")]
    /// Reads a sketch written by [`HyperLogLog::save`]; requires the `serde` feature.
    pub fn load<R: std::io::Read>(mut reader: R) -> std::io::Result<Self> {
        bincode::deserialize_from(&mut reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HyperLogLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HyperLogLog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
        HyperLogLog::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Estimates the cardinality of the union of two or more sketches.
///
/// Equivalent to merging all sketches into one and counting it, without
/// mutating any input.
pub fn union_count(sketches: &[&HyperLogLog]) -> Result<f64> {
    if sketches.len() < 2 {
        return Err(SketchError::InvalidArgument(
            "less than 2 HyperLogLog sketches were given".to_string(),
        ));
    }
    let head = sketches[0];
    for h in &sketches[1..] {
        check_same_precision(head.p, h.p)?;
    }
    let mut combined = head.registers.to_vec();
    for h in &sketches[1..] {
        registers::merge_max(&mut combined, &h.registers);
    }
    Ok(registers::estimate(&combined))
}

/// Estimates `|A ∩ B|` by inclusion-exclusion.
///
/// Estimation error can make the result negative; it is not clamped.
pub fn intersection_count(a: &HyperLogLog, b: &HyperLogLog) -> Result<f64> {
    let union = union_count(&[a, b])?;
    Ok(a.count() + b.count() - union)
}

/// Estimates `|A ∩ B| / |A ∪ B|`. Two empty sketches are identical (1.0).
pub fn jaccard(a: &HyperLogLog, b: &HyperLogLog) -> Result<f64> {
    let union = union_count(&[a, b])?;
    if union == 0.0 {
        return Ok(1.0);
    }
    Ok((a.count() + b.count() - union) / union)
}

/// Estimates `|A ∩ B| / |A|`, how much of `a` is contained in `b`.
///
/// Two empty sketches give 1.0, as does an empty `a`: the empty set is
/// contained in every set.
pub fn inclusion(a: &HyperLogLog, b: &HyperLogLog) -> Result<f64> {
    let union = union_count(&[a, b])?;
    let count_a = a.count();
    if union == 0.0 || count_a == 0.0 {
        return Ok(1.0);
    }
    Ok((count_a + b.count() - union) / count_a)
}
