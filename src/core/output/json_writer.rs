//! Nested JSON output writer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::record::SanitizedRecord;

/// Writes records to a file as a pretty-printed JSON array.
///
/// # Format
/// ```json
/// [
///   {
///     "id": "2",
///     "created_at": "2024-01-02T00:00:00Z",
///     "content": "Hello world (http://x)"
///   }
/// ]
/// ```
pub fn write_json(records: &[SanitizedRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let json = to_json(records)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Converts records to a pretty-printed JSON array.
///
/// Same format as [`write_json`], but returns a String instead of writing to
/// a file. Records are serialized verbatim, keys in their original order.
pub fn to_json(records: &[SanitizedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
