//! Core merge logic for tootpack.
//!
//! This module contains:
//! - [`normalize`] - Deep HTML sanitization of rich-text fields
//! - [`flatten`] - Nested record → tabular key paths
//! - [`dedup`] - First-occurrence-wins identifier index
//! - [`sort`] - Stable newest-first ordering by timestamp
//! - [`output`] - Nested JSON and flattened CSV writers
//! - [`pipeline`] - The driver tying the stages together
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # fn main() -> tootpack::Result<()> {
//! use std::path::Path;
//! use tootpack::config::MergeConfig;
//! use tootpack::core::{merge_files, write_outputs};
//!
//! let (dataset, stats) = merge_files(&["outbox-1.json", "outbox-2.json"], MergeConfig::default())?;
//! write_outputs(dataset.records(), Some(Path::new("output.json")), Some(Path::new("output.csv")))?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

pub mod dedup;
pub mod flatten;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod sort;

// Re-export main types for convenience
pub use dedup::{Admission, DedupIndex, find_duplicate_ids};
pub use flatten::flatten;
pub use normalize::{NormalizeStats, normalize, normalize_with_stats};
pub use output::{ExportedDocuments, export_all, to_csv, to_json, write_csv, write_json, write_outputs};
pub use pipeline::{
    ArchiveSource, DuplicateReport, FileSummary, MergePipeline, MergeStats, MergedDataset,
    audit_duplicates, merge_files, merge_sources,
};
pub use sort::{parse_timestamp, sort_by_timestamp};
