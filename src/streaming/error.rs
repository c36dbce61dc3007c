//! Decoder errors.
//!
//! Every variant means the archive is not a well-formed JSON array. The
//! pipeline wraps it into [`TootpackError::MalformedInput`](crate::TootpackError::MalformedInput)
//! together with the archive name.

use std::io;

use thiserror::Error;

/// Result type for streaming operations.
pub type StreamingResult<T> = Result<T, StreamingError>;

/// Why an archive could not be decoded.
#[derive(Debug, Error)]
pub enum StreamingError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    /// An array element is not valid JSON. `index` is zero-based.
    #[error("element {index} is not valid JSON: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a top-level JSON array, found '{found}'")]
    NotAnArray { found: char },

    /// Structural problem around the array elements (separators, brackets).
    #[error("malformed array: {0}")]
    InvalidFormat(String),

    #[error("archive ends before the closing bracket")]
    UnexpectedEof,

    /// A single element exceeds `StreamingConfig::max_record_size`.
    #[error("element too large: {actual_size} bytes (max: {max_size})")]
    ElementTooLarge { max_size: usize, actual_size: usize },
}

impl StreamingError {
    /// Returns `true` for failures of the underlying reader rather than
    /// of the archive contents.
    pub fn is_io(&self) -> bool {
        matches!(self, StreamingError::Io(_))
    }
}
