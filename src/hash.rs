use xxhash_rust::xxh32::Xxh32;

/// Anything that exposes a deterministic 32-bit hash.
///
/// Sketches never hash raw items themselves. Callers hash an item with the
/// function of their choice and hand over a value implementing this trait;
/// a plain `u32` is taken as an already computed hash.
pub trait Hash32 {
    fn hash32(&self) -> u32;
}

impl Hash32 for u32 {
    #[inline]
    fn hash32(&self) -> u32 {
        *self
    }
}

impl<T: Hash32 + ?Sized> Hash32 for &T {
    #[inline]
    fn hash32(&self) -> u32 {
        (**self).hash32()
    }
}

/// A streaming xxh32 state contributes the digest of everything written so far.
impl Hash32 for Xxh32 {
    #[inline]
    fn hash32(&self) -> u32 {
        self.digest()
    }
}
