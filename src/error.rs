use thiserror::Error;

/// Errors returned by sketch constructors, merges, estimators and codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    /// A constructor or estimator received an argument outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Two sketches of different shape (seed, permutation count or precision) were combined.
    #[error("incompatible sketch: {0}")]
    IncompatibleSketch(String),
    /// The serialization target cannot hold the encoded sketch.
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
    /// The serialized source ends before the length its header declares.
    #[error("truncated buffer: need {needed} bytes, got {actual}")]
    TruncatedBuffer { needed: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, SketchError>;
