//! Output format writers.
//!
//! Every merged dataset is exported twice:
//! - [`write_json`] / [`to_json`] - nested JSON array, records verbatim
//! - [`write_csv`] / [`to_csv`] - flattened CSV, one column per key path
//!
//! # Choosing a Format
//!
//! | Format | Use Case | Structure |
//! |--------|----------|-----------|
//! | JSON | Re-import, APIs, further merging | Lossless |
//! | CSV | Spreadsheets, pandas, SQL import | Flattened |
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> tootpack::Result<()> {
//! use tootpack::core::output::{export_all, write_outputs};
//! use std::path::Path;
//! use tootpack::SanitizedRecord;
//!
//! let records: Vec<SanitizedRecord> = Vec::new();
//!
//! // Write both files
//! write_outputs(&records, Some(Path::new("output.json")), Some(Path::new("output.csv")))?;
//!
//! // Or get both documents as strings
//! let docs = export_all(&records)?;
//! assert_eq!(docs.nested, "[]");
//! assert_eq!(docs.tabular, "");
//! # Ok(())
//! # }
//! ```

mod csv_writer;
mod json_writer;

use std::fs;
use std::path::{Path, PathBuf};

pub use csv_writer::{csv_header, to_csv, write_csv};
pub use json_writer::{to_json, write_json};

use crate::error::Result;
use crate::record::SanitizedRecord;

/// Both renderings of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocuments {
    /// Pretty-printed JSON array
    pub nested: String,
    /// CSV text with CRLF line endings
    pub tabular: String,
}

/// Renders the nested and tabular documents.
pub fn export_all(records: &[SanitizedRecord]) -> Result<ExportedDocuments> {
    Ok(ExportedDocuments {
        nested: to_json(records)?,
        tabular: to_csv(records)?,
    })
}

/// Renders the requested documents in memory, then writes them.
///
/// A path of `None` skips that format. Nothing touches the file system
/// until every requested document rendered successfully. Each document is
/// staged next to its target and renamed into place only after every
/// staged write succeeded, so a failed run leaves no partial output.
pub fn write_outputs(
    records: &[SanitizedRecord],
    json_path: Option<&Path>,
    csv_path: Option<&Path>,
) -> Result<()> {
    let nested = json_path.map(|_| to_json(records)).transpose()?;
    let tabular = csv_path.map(|_| to_csv(records)).transpose()?;

    let pending: Vec<(&Path, String, &str)> = [
        json_path.zip(nested).map(|(path, doc)| (path, doc, "JSON")),
        csv_path.zip(tabular).map(|(path, doc)| (path, doc, "CSV")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut staged: Vec<(PathBuf, &Path, &str)> = Vec::with_capacity(pending.len());
    for (path, doc, format) in pending {
        let temp = staging_path(path);
        if let Err(err) = fs::write(&temp, doc) {
            discard(staged.iter().map(|(temp, _, _)| temp.as_path()).chain([temp.as_path()]));
            return Err(err.into());
        }
        staged.push((temp, path, format));
    }

    for (idx, (temp, path, _)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(temp, path) {
            discard(staged[idx..].iter().map(|(temp, _, _)| temp.as_path()));
            discard(staged[..idx].iter().map(|(_, path, _)| *path));
            return Err(err.into());
        }
    }

    for (_, path, format) in &staged {
        tracing::info!(path = %path.display(), records = records.len(), "wrote {format} output");
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn discard<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %err, "could not remove partial output");
        }
    }
}
