//! Verbatim file backup of the database.

use crate::error::{StoreError, StoreResult};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension used when the source file has none.
const DEFAULT_EXTENSION: &str = "sqlite3";

/// Copies `source` into `destination` under a timestamped name and returns
/// the path of the copy.
///
/// The backup name is the source file stem with a `_Backup_` timestamp
/// suffix, keeping the original extension. The copy is byte-for-byte; no
/// compaction or schema rewriting happens on the way.
pub(crate) fn backup_file(source: &Path, destination: &Path) -> StoreResult<PathBuf> {
    if !source.is_file() {
        return Err(StoreError::backup(format!(
            "source {} is not a readable file",
            source.display()
        )));
    }
    if !destination.is_dir() {
        return Err(StoreError::backup(format!(
            "destination {} is not a folder",
            destination.display()
        )));
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("database");
    let extension = source
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    let timestamp = Local::now().format("%Y-%m-%d_%H.%M.%S");
    let backup_path = destination.join(format!("{stem}_Backup_{timestamp}.{extension}"));

    fs::copy(source, &backup_path).map_err(|err| {
        StoreError::backup(format!(
            "copying {} to {} failed: {err}",
            source.display(),
            backup_path.display()
        ))
    })?;
    Ok(backup_path)
}
