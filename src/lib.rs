//! Probabilistic sketches over 32-bit hashes:
//!
//! - [`MinHash`]: permutation-based signature for Jaccard similarity, with a
//!   compressed [`OneBitMinHash`] export.
//! - [`HyperLogLog`]: register-based cardinality counter, with union,
//!   intersection, Jaccard and inclusion estimates across sketches.
//! - [`HllMinHash`]: one structure answering both cardinality and similarity.
//!
//! The sketches never hash raw items. Callers supply anything implementing
//! [`Hash32`], typically a `u32` from their own hash function.
//!
//! ```
//! use minhll::{hyperloglog, HyperLogLog};
//!
//! let mut a = HyperLogLog::new(14)?;
//! let mut b = HyperLogLog::new(14)?;
//! for x in [0x1234_5678u32, 0x9abc_def0, 0x0fed_cba9] {
//!     a.add(x);
//! }
//! b.add(0x1234_5678u32);
//! assert!(hyperloglog::union_count(&[&a, &b])? >= a.count());
//! # Ok::<(), minhll::SketchError>(())
//! ```

pub mod bitops;
mod error;
mod hash;
pub mod hllminhash;
pub mod hyperloglog;
pub mod minhash;
pub mod onebit;
pub mod permutation;
mod registers;

pub use error::{Result, SketchError};
pub use hash::Hash32;
pub use hllminhash::HllMinHash;
pub use hyperloglog::HyperLogLog;
pub use minhash::MinHash;
pub use onebit::{OneBitMinHash, ONE_BIT_CAPACITY};
pub use permutation::MERSENNE_PRIME;
pub use registers::{MAX_PRECISION, MIN_PRECISION};
