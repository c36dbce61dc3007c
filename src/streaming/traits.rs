//! Core traits for the streaming decoder.
//!
//! - [`RecordIterator`] - Iterator over array elements with progress tracking
//! - [`StreamingConfig`] - Buffer and size limits

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StreamingResult;

/// Iterator over the elements of an archive with progress tracking.
///
/// Extends the standard [`Iterator`] trait with methods for monitoring
/// decoding progress, useful for progress bars and logging.
///
/// # Object Safety
///
/// This trait is object-safe, enabling dynamic dispatch via `Box<dyn RecordIterator>`.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> tootpack::Result<()> {
/// use tootpack::streaming::{ArchiveDecoder, RecordIterator};
///
/// let mut iter = ArchiveDecoder::new().open("outbox-1.json")?;
///
/// while let Some(result) = iter.next() {
///     let _value = result.map_err(|e| tootpack::TootpackError::malformed_input("outbox-1.json", e))?;
///
///     if let Some(pct) = iter.progress() {
///         eprintln!("\r{:.1}%", pct);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub trait RecordIterator: Iterator<Item = StreamingResult<Value>> {
    /// Returns approximate progress as a percentage (0.0 to 100.0).
    ///
    /// Returns `None` if progress cannot be determined (e.g., unknown size).
    fn progress(&self) -> Option<f64> {
        match self.total_bytes() {
            Some(total) if total > 0 => {
                Some((self.bytes_processed() as f64 / total as f64) * 100.0)
            }
            _ => None,
        }
    }

    /// Returns the number of bytes consumed so far.
    fn bytes_processed(&self) -> u64;

    /// Returns the total stream size in bytes, if known.
    fn total_bytes(&self) -> Option<u64> {
        None
    }
}

/// Configuration options for the streaming decoder.
///
/// # Examples
///
/// ```
/// use tootpack::streaming::StreamingConfig;
///
/// let config = StreamingConfig::new()
///     .with_buffer_size(128 * 1024)        // 128KB read buffer
///     .with_max_record_size(1024 * 1024);  // 1MB per record
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Buffer size for file reading.
    ///
    /// Default: 64KB. Larger buffers improve throughput but use more memory.
    pub buffer_size: usize,

    /// Maximum size of a single array element in bytes.
    ///
    /// Default: 10MB. Larger elements abort the archive with
    /// [`StreamingError::ElementTooLarge`](super::StreamingError::ElementTooLarge).
    pub max_record_size: usize,

    /// Emit a trace event every N records.
    ///
    /// Default: 10,000.
    pub progress_interval: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,            // 64KB
            max_record_size: 10 * 1024 * 1024, // 10MB
            progress_interval: 10_000,
        }
    }
}

impl StreamingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the maximum record size.
    #[must_use]
    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// Sets the progress reporting interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_config_default() {
        let config = StreamingConfig::default();
        assert_eq!(config.buffer_size, 64 * 1024);
        assert_eq!(config.max_record_size, 10 * 1024 * 1024);
        assert_eq!(config.progress_interval, 10_000);
    }

    #[test]
    fn test_streaming_config_builder_chain() {
        let config = StreamingConfig::new()
            .with_buffer_size(256 * 1024)
            .with_max_record_size(20 * 1024 * 1024)
            .with_progress_interval(1000);

        assert_eq!(config.buffer_size, 256 * 1024);
        assert_eq!(config.max_record_size, 20 * 1024 * 1024);
        assert_eq!(config.progress_interval, 1000);
    }

    #[test]
    fn test_streaming_config_serde_fills_defaults() {
        let config: StreamingConfig = serde_json::from_str(r#"{"buffer_size": 4096}"#).unwrap();
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.max_record_size, 10 * 1024 * 1024);
    }

    struct Fixed {
        done: u64,
        total: Option<u64>,
    }

    impl Iterator for Fixed {
        type Item = StreamingResult<Value>;
        fn next(&mut self) -> Option<Self::Item> {
            None
        }
    }

    impl RecordIterator for Fixed {
        fn bytes_processed(&self) -> u64 {
            self.done
        }
        fn total_bytes(&self) -> Option<u64> {
            self.total
        }
    }

    #[test]
    fn test_default_progress() {
        let half = Fixed {
            done: 50,
            total: Some(100),
        };
        assert_eq!(half.progress(), Some(50.0));

        let unknown = Fixed {
            done: 50,
            total: None,
        };
        assert!(unknown.progress().is_none());

        let empty = Fixed {
            done: 0,
            total: Some(0),
        };
        assert!(empty.progress().is_none());
    }
}
