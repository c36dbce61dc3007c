//! Input discovery.
//!
//! Turns the paths given on the command line into the ordered list of
//! archives to merge. Files are taken as given; directories contribute
//! their direct children with a matching extension, sorted by name so runs
//! are reproducible.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TootpackError};

/// Default archive extension.
pub const DEFAULT_EXTENSION: &str = "json";

/// Expands files and directories into a deduplicated list of archives.
///
/// Directory entries are matched on `extension` case-insensitively and are
/// not searched recursively. A path listed twice is kept once, at its first
/// position.
///
/// ```no_run
/// # fn main() -> tootpack::Result<()> {
/// use tootpack::sources::collect_input_files;
///
/// let files = collect_input_files(&["./data", "extra/outbox.json"], "json")?;
/// for file in &files {
///     println!("{}", file.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn collect_input_files<P: AsRef<Path>>(inputs: &[P], extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        let metadata = fs::metadata(input).map_err(|err| TootpackError::read(input, err))?;

        let found = if metadata.is_dir() {
            list_directory(input, extension)?
        } else if metadata.is_file() {
            vec![input.to_path_buf()]
        } else {
            return Err(TootpackError::invalid_input(
                input,
                "not a regular file or directory",
            ));
        };

        for path in found {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn list_directory(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|err| TootpackError::read(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| TootpackError::read(dir, err))?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            continue;
        }
        if has_extension(&path, extension) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(dir = %dir.display(), archives = files.len(), "scanned directory");
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
