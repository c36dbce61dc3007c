//! The merge driver.
//!
//! [`MergePipeline`] owns the dedup index and the accumulation buffer for
//! one run. Archives are ingested strictly one after another; each element
//! is decoded, normalized and offered to the index before the next one is
//! read. [`MergePipeline::finish`] sorts the buffer into a
//! [`MergedDataset`].

use std::fmt;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::MergeConfig;
use crate::core::dedup::{Admission, DedupIndex, duplicate_identifiers};
use crate::core::normalize::normalize_with_stats;
use crate::core::sort::sort_by_timestamp;
use crate::error::{Result, TootpackError};
use crate::record::{RawRecord, SanitizedRecord};
use crate::streaming::{ArchiveDecoder, JsonArrayStream, RecordIterator};

/// A readable archive tagged with a display name for diagnostics.
#[derive(Debug)]
pub struct ArchiveSource<R> {
    /// Name used in logs and errors, usually the file path
    pub name: String,
    /// The archive bytes
    pub reader: R,
}

impl<R: Read> ArchiveSource<R> {
    /// Tags a reader with a name.
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Archives ingested
    pub files: usize,
    /// Array elements decoded
    pub records_seen: usize,
    /// Records kept
    pub admitted: usize,
    /// Records dropped for lacking an identifier
    pub missing_identifier: usize,
    /// Records dropped as repeats of an earlier identifier
    pub duplicates: usize,
    /// Elements that were not JSON objects
    pub skipped_non_objects: usize,
    /// Rich-text fields kept raw because they could not be parsed
    pub sanitize_fallbacks: usize,
    /// Transient keys removed
    pub dropped_keys: usize,
}

impl MergeStats {
    /// Records rejected for any reason.
    pub fn rejected(&self) -> usize {
        self.missing_identifier + self.duplicates + self.skipped_non_objects
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} records seen, {} kept, {} duplicates, {} without id",
            self.files, self.records_seen, self.admitted, self.duplicates, self.missing_identifier
        )
    }
}

/// Counters for a single archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// Display name of the archive
    pub name: String,
    /// Elements decoded from this archive
    pub records_seen: usize,
    /// Records from this archive that were kept
    pub admitted: usize,
}

/// Sorted, deduplicated result of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    records: Vec<SanitizedRecord>,
}

impl MergedDataset {
    /// Records, most recent first.
    pub fn records(&self) -> &[SanitizedRecord] {
        &self.records
    }

    /// Unwraps the record list.
    pub fn into_records(self) -> Vec<SanitizedRecord> {
        self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the run admitted nothing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drives one merge run.
///
/// ```
/// # fn main() -> tootpack::Result<()> {
/// use tootpack::config::MergeConfig;
/// use tootpack::core::{ArchiveSource, MergePipeline};
///
/// let mut pipeline = MergePipeline::new(MergeConfig::default())?;
/// pipeline.ingest(ArchiveSource::new("a.json", &br#"[{"id":"1","created_at":"2024-01-01"}]"#[..]))?;
/// pipeline.ingest(ArchiveSource::new("b.json", &br#"[{"id":"1"},{"id":"2","created_at":"2024-02-01"}]"#[..]))?;
///
/// let stats = *pipeline.stats();
/// let dataset = pipeline.finish();
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.records()[0].get_str("id"), Some("2"));
/// assert_eq!(stats.duplicates, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MergePipeline {
    config: MergeConfig,
    decoder: ArchiveDecoder,
    index: DedupIndex,
    buffer: Vec<SanitizedRecord>,
    stats: MergeStats,
}

impl MergePipeline {
    /// Creates a pipeline after validating the configuration.
    pub fn new(config: MergeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            decoder: ArchiveDecoder::with_config(config.streaming),
            index: DedupIndex::with_id_field(config.id_field.clone()),
            buffer: Vec::new(),
            stats: MergeStats::default(),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    /// Ingests an archive from disk.
    pub fn ingest_path(&mut self, path: impl AsRef<Path>) -> Result<FileSummary> {
        let stream = self.decoder.open(path)?;
        self.ingest_stream(stream)
    }

    /// Ingests an archive from any reader.
    pub fn ingest<R: Read>(&mut self, source: ArchiveSource<R>) -> Result<FileSummary> {
        let stream = self.decoder.from_reader(source.reader, source.name, None);
        self.ingest_stream(stream)
    }

    fn ingest_stream<R: BufRead>(&mut self, mut stream: JsonArrayStream<R>) -> Result<FileSummary> {
        let name = stream.name().to_string();
        tracing::info!(archive = %name, "ingesting archive");

        let progress_interval = self.config.streaming.progress_interval;
        let mut summary = FileSummary {
            name,
            records_seen: 0,
            admitted: 0,
        };

        while let Some(item) = stream.next() {
            let value = item.map_err(|e| TootpackError::malformed_input(&summary.name, e))?;
            summary.records_seen += 1;
            self.stats.records_seen += 1;

            if progress_interval > 0 && summary.records_seen % progress_interval == 0 {
                tracing::trace!(
                    archive = %summary.name,
                    records = summary.records_seen,
                    progress = ?stream.progress(),
                    "decoding"
                );
            }

            let Some(raw) = RawRecord::from_value(value) else {
                tracing::debug!(
                    archive = %summary.name,
                    position = summary.records_seen,
                    "skipping non-object element"
                );
                self.stats.skipped_non_objects += 1;
                continue;
            };

            if self.offer(raw, &summary.name) {
                summary.admitted += 1;
            }
        }

        self.stats.files += 1;
        tracing::info!(
            archive = %summary.name,
            records = summary.records_seen,
            admitted = summary.admitted,
            "archive done"
        );
        Ok(summary)
    }

    /// Normalizes one record and keeps it if the index admits it.
    fn offer(&mut self, raw: RawRecord, archive: &str) -> bool {
        let (record, norm) = normalize_with_stats(
            raw,
            &self.config.rich_text_keys,
            &self.config.drop_keys,
        );
        self.stats.sanitize_fallbacks += norm.fallbacks;
        self.stats.dropped_keys += norm.dropped_keys;

        match self.index.admit_with_reason(&record) {
            Admission::Admitted => {
                self.buffer.push(record);
                self.stats.admitted += 1;
                true
            }
            Admission::MissingIdentifier => {
                tracing::debug!(archive, field = %self.config.id_field, "dropping record without identifier");
                self.stats.missing_identifier += 1;
                false
            }
            Admission::Duplicate => {
                tracing::debug!(
                    archive,
                    id = ?record.identifier(&self.config.id_field),
                    "dropping duplicate record"
                );
                self.stats.duplicates += 1;
                false
            }
        }
    }

    /// Sorts the accumulated records, most recent first.
    pub fn finish(self) -> MergedDataset {
        MergedDataset {
            records: sort_by_timestamp(self.buffer, &self.config.timestamp_field),
        }
    }
}

/// Merges archives from disk in the given order.
///
/// The first error aborts the run.
pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    config: MergeConfig,
) -> Result<(MergedDataset, MergeStats)> {
    let mut pipeline = MergePipeline::new(config)?;
    for path in paths {
        pipeline.ingest_path(path)?;
    }
    let stats = *pipeline.stats();
    Ok((pipeline.finish(), stats))
}

/// Merges in-memory or otherwise opened archives in the given order.
pub fn merge_sources<R, I>(sources: I, config: MergeConfig) -> Result<(MergedDataset, MergeStats)>
where
    R: Read,
    I: IntoIterator<Item = ArchiveSource<R>>,
{
    let mut pipeline = MergePipeline::new(config)?;
    for source in sources {
        pipeline.ingest(source)?;
    }
    let stats = *pipeline.stats();
    Ok((pipeline.finish(), stats))
}

/// Result of auditing a merged output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Audited file
    pub path: PathBuf,
    /// Records in the file
    pub records: usize,
    /// Identifiers seen more than once (one entry per extra copy)
    pub duplicates: Vec<String>,
}

impl DuplicateReport {
    /// Returns `true` if every identifier is unique.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Streams a merged JSON array and lists repeated identifiers.
pub fn audit_duplicates(path: impl AsRef<Path>, config: &MergeConfig) -> Result<DuplicateReport> {
    let path = path.as_ref();
    let decoder = ArchiveDecoder::with_config(config.streaming);
    let stream = decoder.open(path)?;
    let name = stream.name().to_string();

    let mut records = 0;
    let mut ids = Vec::new();
    for item in stream {
        let value = item.map_err(|e| TootpackError::malformed_input(&name, e))?;
        records += 1;
        if let Some(id) = RawRecord::from_value(value).and_then(|r| r.identifier(&config.id_field)) {
            ids.push(id);
        }
    }

    Ok(DuplicateReport {
        path: path.to_path_buf(),
        records,
        duplicates: duplicate_identifiers(ids),
    })
}
