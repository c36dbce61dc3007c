//! # Tootpack
//!
//! A Rust library for merging exported social timeline archives (outboxes,
//! status dumps) into one deduplicated, chronologically ordered dataset.
//!
//! ## Overview
//!
//! Each input archive is a JSON array of post-like records. Tootpack:
//! - **streams** every archive element by element, so multi-gigabyte exports
//!   do not have to fit in memory during parsing
//! - **sanitizes** HTML in rich-text fields (`content`, `note`, at any depth)
//!   into plain text, keeping link targets as `text (href)`
//! - **deduplicates** records across archives by identifier (first wins)
//! - **sorts** the result newest first by `created_at`
//! - **exports** it twice: nested JSON and flattened CSV
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tootpack::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let files = collect_input_files(&["./data"], "json")?;
//!     let (dataset, stats) = merge_files(&files, MergeConfig::default())?;
//!
//!     write_outputs(
//!         dataset.records(),
//!         Some(Path::new("output.json")),
//!         Some(Path::new("output.csv")),
//!     )?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```
//!
//! ## Working With Single Records
//!
//! ```rust
//! use serde_json::json;
//! use tootpack::prelude::*;
//!
//! let raw = RawRecord::from_value(json!({
//!     "id": "1",
//!     "created_at": "2024-01-01",
//!     "content": "<p>Hello <a href=\"http://x\">world</a></p>"
//! })).unwrap();
//!
//! let record = normalize(raw, &RichTextKeys::default());
//! assert_eq!(record.get_str("content"), Some("Hello world (http://x)"));
//!
//! let flat = flatten(&record);
//! assert_eq!(flat.cell("content"), "Hello world (http://x)");
//! ```
//!
//! ## Module Structure
//!
//! - [`streaming`] - Element-by-element JSON array decoder
//! - [`sanitize`] - HTML fragment → plain text
//! - [`record`] - [`RawRecord`], [`SanitizedRecord`], [`FlatRecord`]
//! - [`core`] - Merge stages and the [`MergePipeline`](core::MergePipeline) driver
//!   - [`core::normalize`], [`core::flatten`], [`core::dedup`], [`core::sort`]
//!   - [`core::output`] - [`write_json`](core::write_json), [`write_csv`](core::write_csv)
//! - [`config`] - [`MergeConfig`], [`RichTextKeys`](config::RichTextKeys)
//! - [`sources`] - Input file discovery
//! - [`cli`] - CLI argument types (feature `cli`)
//! - [`error`] - Unified error types ([`TootpackError`], [`Result`])
//! - [`prelude`] - Convenient re-exports
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (per archive at `info`, per dropped
//! record at `debug`, progress at `trace`). It never installs a subscriber;
//! the `tootpack` binary does.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod record;
pub mod sanitize;
pub mod sources;
pub mod streaming;

// Re-export the main types at the crate root for convenience
pub use config::MergeConfig;
pub use error::{Result, TootpackError};
pub use record::{FlatRecord, RawRecord, SanitizedRecord};

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use tootpack::prelude::*;
/// ```
pub mod prelude {
    // Record types
    pub use crate::record::{FlatRecord, RawRecord, SanitizedRecord};

    // Error types
    pub use crate::error::{Result, TootpackError};

    // Configuration
    pub use crate::config::{MergeConfig, RichTextKeys};
    pub use crate::streaming::StreamingConfig;

    // Stages
    pub use crate::core::dedup::{Admission, DedupIndex, find_duplicate_ids};
    pub use crate::core::flatten::flatten;
    pub use crate::core::normalize::{normalize, normalize_with_stats};
    pub use crate::core::sort::{parse_timestamp, sort_by_timestamp};
    pub use crate::sanitize::sanitize;

    // Driver
    pub use crate::core::pipeline::{
        ArchiveSource, MergePipeline, MergeStats, MergedDataset, merge_files, merge_sources,
    };

    // Output (file writers and string converters)
    pub use crate::core::output::{
        ExportedDocuments, export_all, to_csv, to_json, write_csv, write_json, write_outputs,
    };

    // Input discovery
    pub use crate::sources::collect_input_files;
}
