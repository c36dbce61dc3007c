//! Streaming decoder for memory-efficient ingestion of large archives.
//!
//! Timeline exports can run into gigabytes. Instead of reading a whole file
//! into a `serde_json::Value`, the decoder yields one array element at a
//! time, so the parse working set is bounded by the largest single record.
//!
//! # Architecture
//!
//! - [`ArchiveDecoder`] - opens files or wraps readers
//! - [`JsonArrayStream`] - the lazy element iterator
//! - [`RecordIterator`] - progress tracking on top of [`Iterator`]
//!
//! # Example
//!
//! ```rust,no_run
//! use tootpack::streaming::ArchiveDecoder;
//!
//! let decoder = ArchiveDecoder::new();
//!
//! let values: Vec<serde_json::Value> = decoder
//!     .open("outbox.json")
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! ```
//!
//! # Memory Usage
//!
//! | Approach | 1GB File | 10GB File |
//! |----------|----------|-----------|
//! | `serde_json::from_reader` | ~3GB RAM | ~30GB RAM |
//! | [`JsonArrayStream`] | largest record + 64KB | largest record + 64KB |
//!
//! Records admitted by the pipeline are still kept in memory until export.

mod array;
mod error;
mod traits;

pub use array::{ArchiveDecoder, JsonArrayStream};
pub use error::{StreamingError, StreamingResult};
pub use traits::{RecordIterator, StreamingConfig};
