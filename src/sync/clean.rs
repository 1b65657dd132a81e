//! Destination cleanup: remove everything except the preserved entries.

use super::SyncError;
use crate::log;
use std::{collections::BTreeSet, ffi::OsString, fs, io, path::Path};

/// What cleanup did to the destination.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: Vec<OsString>,
    pub kept: Vec<OsString>,
    /// Entries that could not be removed; the run continues past them.
    pub failures: Vec<SyncError>,
}

/// Remove every top-level entry of `dest` whose name is not in `preserve`.
///
/// Directories are removed recursively. A failure on one entry is logged and
/// recorded, the rest are still processed. Only failing to list `dest` itself
/// is returned as an error.
pub fn clean_destination(dest: &Path, preserve: &BTreeSet<String>) -> Result<CleanReport, SyncError> {
    let read_err = |source| SyncError::ReadDir {
        path: dest.to_path_buf(),
        source,
    };

    let mut report = CleanReport::default();
    let mut names: Vec<OsString> = fs::read_dir(dest)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<io::Result<_>>()
        .map_err(read_err)?;
    names.sort();

    for name in names {
        if preserve.contains(name.to_string_lossy().as_ref()) {
            report.kept.push(name);
            continue;
        }

        let path = dest.join(&name);
        match remove_entry(&path) {
            Ok(()) => report.removed.push(name),
            Err(source) => {
                let err = SyncError::CleanupEntryFailure { path, source };
                log!("warning"; "{}, skipping", err);
                report.failures.push(err);
            }
        }
    }

    Ok(report)
}

/// Remove a file, symlink or directory tree. Symlinks are never followed.
fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
