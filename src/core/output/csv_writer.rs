//! Flattened CSV output writer.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};

use crate::core::flatten::flatten;
use crate::error::{Result, TootpackError};
use crate::record::{FlatRecord, SanitizedRecord};

/// Writes records to a CSV file.
///
/// # Format
/// - Delimiter: `,`
/// - Header: union of every record's flattened keys, in order of first
///   appearance
/// - Absent keys: empty field
/// - Line ending: CRLF
/// - Encoding: UTF-8
pub fn write_csv(records: &[SanitizedRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let csv = to_csv(records)?;
    let mut file = File::create(output_path)?;
    file.write_all(csv.as_bytes())?;
    Ok(())
}

/// Converts records to CSV text.
///
/// An empty record set produces an empty document, not a lone header.
///
/// ```
/// use serde_json::json;
/// use tootpack::config::RichTextKeys;
/// use tootpack::core::{normalize::normalize, output::to_csv};
/// use tootpack::RawRecord;
///
/// let rec = |v| normalize(RawRecord::from_value(v).unwrap(), &RichTextKeys::default());
/// let csv = to_csv(&[
///     rec(json!({"id": "1", "account": {"acct": "a"}})),
///     rec(json!({"id": "2", "sensitive": true})),
/// ]).unwrap();
///
/// assert_eq!(csv, "id,account.acct,sensitive\r\n1,a,\r\n2,,true\r\n");
/// ```
pub fn to_csv(records: &[SanitizedRecord]) -> Result<String> {
    let flats: Vec<FlatRecord> = records.iter().map(flatten).collect();
    let header = union_header(&flats);
    if header.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&header)?;
    for flat in &flats {
        writer.write_record(header.iter().map(|key| flat.cell(key)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TootpackError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Returns the CSV header the records would produce.
pub fn csv_header(records: &[SanitizedRecord]) -> Vec<String> {
    let flats: Vec<FlatRecord> = records.iter().map(flatten).collect();
    union_header(&flats)
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn union_header(flats: &[FlatRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut header = Vec::new();
    for key in flats.iter().flat_map(FlatRecord::keys) {
        if seen.insert(key) {
            header.push(key);
        }
    }
    header
}
