//! Unified error types for tootpack.
//!
//! This module provides a single [`TootpackError`] enum that covers every
//! fatal condition in the library. Recoverable conditions (a sanitizer
//! fallback, a record without an identifier, a duplicate) are not errors:
//! they are counted in [`MergeStats`](crate::core::MergeStats) instead.
//!
//! # Error Handling Philosophy
//!
//! - **Library users** get typed errors they can match on
//! - **Application users** get clear, actionable error messages that name the
//!   offending archive
//! - **Developers** get source error chains for debugging

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::streaming::StreamingError;

/// A specialized [`Result`] type for tootpack operations.
///
/// # Example
///
/// ```rust
/// use tootpack::error::Result;
/// use tootpack::SanitizedRecord;
///
/// fn my_function() -> Result<Vec<SanitizedRecord>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, TootpackError>;

/// The error type for all tootpack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TootpackError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - An input file or directory doesn't exist
    /// - Permission denied
    /// - Disk is full (when writing output)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An input file or directory could not be opened or listed.
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        /// The path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A source archive is not a valid JSON array.
    ///
    /// Fatal: the whole run is aborted and no output is written.
    #[error("Malformed input in {source_name}: {source}")]
    MalformedInput {
        /// Display name of the archive (usually its path)
        source_name: String,
        /// What the decoder tripped over
        #[source]
        source: StreamingError,
    },

    /// An input path could not be used as an archive source.
    #[error("Invalid input {}: {message}", path.display())]
    InvalidInput {
        /// The offending path
        path: PathBuf,
        /// Description of what's wrong
        message: String,
    },

    /// The merge configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong
        message: String,
    },

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 encoding error.
    ///
    /// Occurs when rendered output bytes are not valid UTF-8.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<std::string::FromUtf8Error> for TootpackError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        TootpackError::Utf8 {
            context: "output conversion".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl TootpackError {
    /// Creates a malformed-input error for the named archive.
    pub fn malformed_input(source_name: impl Into<String>, source: StreamingError) -> Self {
        TootpackError::MalformedInput {
            source_name: source_name.into(),
            source,
        }
    }

    /// Creates a read error for an input path.
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TootpackError::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TootpackError::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TootpackError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error, with or without a path.
    pub fn is_io(&self) -> bool {
        matches!(self, TootpackError::Io(_) | TootpackError::Read { .. })
    }

    /// Returns `true` if this is a malformed-input error.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, TootpackError::MalformedInput { .. })
    }

    /// Returns `true` if this is an invalid configuration error.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, TootpackError::InvalidConfig { .. })
    }

    /// Returns the archive name for a malformed-input error.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            TootpackError::MalformedInput { source_name, .. } => Some(source_name),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
