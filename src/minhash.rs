//! MinHash signatures built from universal hashing permutations.
//!
//! See Broder, "On the resemblance and containment of documents" for the
//! estimator, and Li & König, "b-Bit Minwise Hashing" for the one-bit export.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, SketchError};
use crate::hash::Hash32;
use crate::onebit::OneBitMinHash;
use crate::permutation::{create_permutations, Permutation};

// seed (i64) + permutation count (u32)
const HEADER_SIZE: usize = 12;

/// A MinHash signature: per permutation, the minimum permuted hash seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHash {
    permutations: Box<[Permutation]>,
    hash_values: Box<[u32]>,
    seed: i64,
}

impl MinHash {
    /// Creates an empty signature with `num_perm` permutations derived from `seed`.
    ///
    /// Higher permutation counts give better estimates at the cost of slower
    /// updates; 128 is a reasonable start. Only signatures sharing both
    /// `num_perm` and `seed` can be compared or merged.
    pub fn new(num_perm: usize, seed: i64) -> Result<Self> {
        if num_perm == 0 {
            return Err(SketchError::InvalidArgument(
                "cannot have non-positive number of permutations".to_string(),
            ));
        }
        if num_perm > u32::MAX as usize {
            return Err(SketchError::InvalidArgument(format!(
                "number of permutations {num_perm} does not fit in 32 bits"
            )));
        }
        tracing::debug!(num_perm, seed, "creating minhash signature");
        Ok(Self {
            permutations: create_permutations(seed, num_perm).into_boxed_slice(),
            hash_values: vec![u32::MAX; num_perm].into_boxed_slice(),
            seed,
        })
    }

    pub fn num_perm(&self) -> usize {
        self.hash_values.len()
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The current minimum per permutation, in permutation order.
    pub fn hash_values(&self) -> &[u32] {
        &self.hash_values
    }

    /// Returns true if nothing has been added since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.hash_values.iter().all(|&v| v == u32::MAX)
    }

    /// Adds an item, represented by its 32-bit hash, to the signature.
    ///
    /// Estimation accuracy depends on the quality of the caller's hash function.
    pub fn add<H: Hash32>(&mut self, item: H) -> &mut Self {
        let hv = item.hash32();
        for (value, perm) in self.hash_values.iter_mut().zip(self.permutations.iter()) {
            let phv = perm.apply(hv);
            if phv < *value {
                *value = phv;
            }
        }
        self
    }

    /// Resets every minimum; the permutations are kept.
    pub fn clear(&mut self) {
        self.hash_values.fill(u32::MAX);
    }

    /// Folds `other` into this signature, as if every item added to `other`
    /// had been added here.
    pub fn merge(&mut self, other: &MinHash) -> Result<&mut Self> {
        self.check_compatible(other)?;
        for (value, &o) in self.hash_values.iter_mut().zip(other.hash_values.iter()) {
            if o < *value {
                *value = o;
            }
        }
        Ok(self)
    }

    fn check_compatible(&self, other: &MinHash) -> Result<()> {
        if self.seed != other.seed {
            tracing::warn!(
                seed = self.seed,
                other_seed = other.seed,
                "rejecting minhash signatures with different seeds"
            );
            return Err(SketchError::IncompatibleSketch(
                "cannot combine MinHash signatures with different seed".to_string(),
            ));
        }
        if self.num_perm() != other.num_perm() {
            tracing::warn!(
                num_perm = self.num_perm(),
                other_num_perm = other.num_perm(),
                "rejecting minhash signatures with different permutation counts"
            );
            return Err(SketchError::IncompatibleSketch(
                "cannot combine MinHash signatures with different numbers of permutations"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Keeps only the lowest bit of the first (at most 128) hash values.
    pub fn export_one_bit(&self) -> OneBitMinHash {
        OneBitMinHash::export(self)
    }

    /// Encoded size: seed, permutation count, then one `u32` per permutation.
    pub fn byte_size(&self) -> usize {
        HEADER_SIZE + 4 * self.num_perm()
    }

    /// Writes the little-endian blob into the front of `buffer`.
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
        LittleEndian::write_i64(&mut blob[0..8], self.seed);
        LittleEndian::write_u32(&mut blob[8..HEADER_SIZE], self.num_perm() as u32);
        LittleEndian::write_u32_into(&self.hash_values, &mut blob[HEADER_SIZE..]);
    }

    /// Reads a blob written by [`MinHash::serialize`].
    ///
    /// Permutations are not stored; they are regenerated from the seed.
    pub fn deserialize(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            tracing::warn!(len = buffer.len(), "minhash blob shorter than its header");
            return Err(SketchError::TruncatedBuffer {
                needed: HEADER_SIZE,
                actual: buffer.len(),
            });
        }
        let seed = LittleEndian::read_i64(&buffer[0..8]);
        let num_perm = LittleEndian::read_u32(&buffer[8..HEADER_SIZE]) as usize;
        let needed = num_perm
            .checked_mul(4)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .unwrap_or(usize::MAX);
        if buffer.len() < needed {
            tracing::warn!(len = buffer.len(), needed, "truncated minhash blob");
            return Err(SketchError::TruncatedBuffer {
                needed,
                actual: buffer.len(),
            });
        }
        let mut sig = Self::new(num_perm, seed)?;
        LittleEndian::read_u32_into(&buffer[HEADER_SIZE..needed], &mut sig.hash_values);
        Ok(sig)
    }

    #[cfg(feature = "serde")]
    /// Writes the signature with bincode; requires the `serde` feature.
    pub fn save<W: std::io::Write>(&self, mut writer: W) -> std::io::Result<()> {
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    #[cfg(feature = "serde")]
    /// Reads a signature written by [`MinHash::save`]; requires the `serde` feature.
    pub fn load<R: std::io::Read>(mut reader: R) -> std::io::Result<Self> {
        bincode::deserialize_from(&mut reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MinHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MinHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
        MinHash::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Estimates the Jaccard similarity among two or more signatures.
///
/// The estimate is the fraction of permutations on which every signature
/// holds the same minimum.
pub fn jaccard(sigs: &[&MinHash]) -> Result<f64> {
    if sigs.len() < 2 {
        return Err(SketchError::InvalidArgument(
            "less than 2 MinHash signatures were given".to_string(),
        ));
    }
    let head = sigs[0];
    for sig in &sigs[1..] {
        head.check_compatible(sig)?;
    }
    let agree = (0..head.num_perm())
        .filter(|&i| {
            sigs[1..]
                .iter()
                .all(|sig| sig.hash_values[i] == head.hash_values[i])
        })
        .count();
    Ok(agree as f64 / head.num_perm() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xxhash_rust::xxh32::xxh32;

    fn hashed(i: u64) -> u32 {
        xxh32(&i.to_le_bytes(), 0)
    }

    #[test]
    fn test_create_minhash() {
        assert!(matches!(
            MinHash::new(0, 1),
            Err(SketchError::InvalidArgument(_))
        ));
        let m = MinHash::new(128, 1).unwrap();
        assert_eq!(m.num_perm(), 128);
        assert_eq!(m.seed(), 1);
        assert!(m.is_empty());
        assert!(m.hash_values().iter().all(|&v| v == u32::MAX));
    }

    #[test]
    fn test_same_item_full_similarity() {
        let mut m1 = MinHash::new(128, 1).unwrap();
        let mut m2 = MinHash::new(128, 1).unwrap();
        m1.add(0x00010fffu32);
        m2.add(0x00010fffu32);
        assert_eq!(jaccard(&[&m1, &m2]).unwrap(), 1.0);

        let mut m3 = MinHash::new(128, 1).unwrap();
        m3.add(0x00010fffu32);
        m2.add(0x01001fffu32);
        assert!(jaccard(&[&m1, &m2, &m3]).unwrap() < 1.0);
    }

    #[test]
    fn test_clear() {
        let mut m1 = MinHash::new(64, 3).unwrap();
        let mut m2 = MinHash::new(64, 3).unwrap();
        m1.add(0xdeadbeefu32);
        m2.add(0xdeadbeefu32);
        m2.clear();
        assert!(m2.is_empty());
        assert_eq!(jaccard(&[&m1, &m2]).unwrap(), 0.0);

        m2.add(0xdeadbeefu32);
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_hash_values_never_increase() {
        let mut m = MinHash::new(32, 11).unwrap();
        let mut previous = m.hash_values().to_vec();
        for i in 0..500 {
            m.add(hashed(i));
            for (now, before) in m.hash_values().iter().zip(&previous) {
                assert!(now <= before);
            }
            previous = m.hash_values().to_vec();
        }
    }

    #[test]
    fn test_incompatible_signatures() {
        let m1 = MinHash::new(128, 1).unwrap();
        let m2 = MinHash::new(128, 2).unwrap();
        assert!(matches!(
            jaccard(&[&m1, &m2]),
            Err(SketchError::IncompatibleSketch(_))
        ));

        let m3 = MinHash::new(256, 1).unwrap();
        assert!(matches!(
            jaccard(&[&m1, &m3]),
            Err(SketchError::IncompatibleSketch(_))
        ));

        assert!(matches!(
            jaccard(&[&m1]),
            Err(SketchError::InvalidArgument(_))
        ));

        let mut m4 = m1.clone();
        assert!(m4.merge(&m2).is_err());
        assert!(m4.merge(&m3).is_err());
        assert_eq!(m4, m1);
    }

    #[test]
    fn test_merge_equals_union() {
        let mut a = MinHash::new(128, 5).unwrap();
        let mut b = MinHash::new(128, 5).unwrap();
        let mut union = MinHash::new(128, 5).unwrap();
        for i in 0..300 {
            a.add(hashed(i));
            union.add(hashed(i));
        }
        for i in 200..600 {
            b.add(hashed(i));
            union.add(hashed(i));
        }
        a.merge(&b).unwrap();
        assert_eq!(a, union);
    }

    #[test]
    fn test_estimation() {
        // |A ∩ B| / |A ∪ B| = 500 / 1500
        let mut a = MinHash::new(256, 42).unwrap();
        let mut b = MinHash::new(256, 42).unwrap();
        for i in 0..1000 {
            a.add(hashed(i));
        }
        for i in 500..1500 {
            b.add(hashed(i));
        }
        let est = jaccard(&[&a, &b]).unwrap();
        assert!(
            (est - 1.0 / 3.0).abs() < 0.12,
            "estimate {est:.3} too far from 0.333"
        );
    }

    #[test]
    fn test_serialization() {
        for num_perm in [1, 7, 128] {
            let mut m = MinHash::new(num_perm, -99).unwrap();
            for i in 0..50 {
                m.add(hashed(i));
            }
            let mut buffer = vec![0; m.byte_size()];
            m.serialize(&mut buffer).unwrap();
            assert_eq!(buffer, m.to_bytes());
            assert_eq!(m.byte_size(), 12 + 4 * num_perm);

            let d = MinHash::deserialize(&buffer).unwrap();
            assert_eq!(d.seed(), m.seed());
            assert_eq!(d.hash_values(), m.hash_values());
            assert_eq!(d, m);
        }
    }

    #[test]
    fn test_serialization_layout() {
        let mut m = MinHash::new(2, 0x0102030405060708).unwrap();
        m.add(0x1234u32);
        let bytes = m.to_bytes();
        assert_eq!(&bytes[0..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &m.hash_values()[0].to_le_bytes());
        assert_eq!(&bytes[16..20], &m.hash_values()[1].to_le_bytes());
    }

    #[test]
    fn test_serialization_errors() {
        let m = MinHash::new(4, 1).unwrap();
        let mut small = vec![0; m.byte_size() - 1];
        assert_eq!(
            m.serialize(&mut small),
            Err(SketchError::BufferTooSmall {
                needed: 28,
                actual: 27
            })
        );

        assert!(matches!(
            MinHash::deserialize(&[0; 11]),
            Err(SketchError::TruncatedBuffer { needed: 12, .. })
        ));
        let bytes = m.to_bytes();
        assert_eq!(
            MinHash::deserialize(&bytes[..bytes.len() - 1]),
            Err(SketchError::TruncatedBuffer {
                needed: 28,
                actual: 27
            })
        );
        // a header declaring zero permutations
        assert!(matches!(
            MinHash::deserialize(&[0; 12]),
            Err(SketchError::InvalidArgument(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_save_and_load() {
        let mut m = MinHash::new(64, 8).unwrap();
        for i in 0..100 {
            m.add(hashed(i));
        }
        let mut buffer = Vec::new();
        m.save(&mut buffer).expect("failed to save MinHash");
        let loaded = MinHash::load(buffer.as_slice()).expect("failed to load MinHash");
        assert_eq!(loaded, m);
    }
}
