//! Copy phase: manifest files into the destination with size verification.

use super::{
    SyncError,
    manifest::{FileManifest, ManifestEntry},
};
use crate::{debug, log, logger::ProgressLine};
use std::{
    fs::{self, File},
    path::Path,
};

/// Outcome of copying one file.
#[derive(Debug)]
pub struct CopyResult {
    pub name: String,
    /// Bytes written, or the source size when the copy failed.
    pub bytes: u64,
    pub error: Option<SyncError>,
}

impl CopyResult {
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Copy every manifest entry into `dest`, continuing past failures.
pub fn copy_manifest(manifest: &FileManifest, dest: &Path) -> Vec<CopyResult> {
    let progress = ProgressLine::new("copy", manifest.len());
    let mut results = Vec::with_capacity(manifest.len());

    for entry in manifest.entries() {
        let result = copy_entry(manifest.dir(), dest, entry);
        match &result.error {
            None => debug!("copy"; "{} ({} bytes)", result.name, result.bytes),
            Some(err) => log!("warning"; "{}", err),
        }
        results.push(result);
        progress.inc();
    }

    progress.finish();
    results
}

fn copy_entry(src_dir: &Path, dest: &Path, entry: &ManifestEntry) -> CopyResult {
    let name = entry.display_name();
    let src = src_dir.join(&entry.file_name);
    let dst = dest.join(&entry.file_name);

    match copy_verified(&src, &dst) {
        Ok(bytes) => CopyResult {
            name,
            bytes,
            error: None,
        },
        Err(reason) => CopyResult {
            error: Some(SyncError::CopyIntegrityFailure {
                name: name.clone(),
                reason,
            }),
            name,
            bytes: entry.size,
        },
    }
}

/// Copy `src` to `dst` keeping permissions and mtime, then compare sizes.
fn copy_verified(src: &Path, dst: &Path) -> Result<u64, String> {
    let src_meta = fs::metadata(src).map_err(|e| format!("cannot stat source: {e}"))?;

    // fs::copy carries permission bits over
    fs::copy(src, dst).map_err(|e| e.to_string())?;

    if let Ok(modified) = src_meta.modified() {
        // Read-only copies cannot be opened for writing; unix accepts a plain handle
        File::options()
            .write(true)
            .open(dst)
            .or_else(|_| File::open(dst))
            .and_then(|f| f.set_modified(modified))
            .map_err(|e| format!("cannot set modification time: {e}"))?;
    }

    let written = fs::metadata(dst)
        .map_err(|e| format!("cannot stat copy: {e}"))?
        .len();
    if written != src_meta.len() {
        return Err(format!(
            "size mismatch: source {} bytes, copy {} bytes",
            src_meta.len(),
            written
        ));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::manifest::ExtensionFilter;

    fn manifest_of(dir: &Path) -> FileManifest {
        FileManifest::scan(dir, &ExtensionFilter::new(["mtsd"])).unwrap()
    }

    #[test]
    fn test_copies_files_with_content() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.mtsd"), b"alpha").unwrap();
        fs::write(src.path().join("b.MTSD"), b"be").unwrap();

        let results = copy_manifest(&manifest_of(src.path()), dst.path());

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(CopyResult::is_success));
        assert_eq!(fs::read(dst.path().join("a.mtsd")).unwrap(), b"alpha");
        assert_eq!(fs::read(dst.path().join("b.MTSD")).unwrap(), b"be");
        assert_eq!(results[0].bytes, 5);
    }

    #[test]
    fn test_preserves_mtime() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let file = src.path().join("old.mtsd");
        fs::write(&file, b"x").unwrap();
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options().write(true).open(&file).unwrap().set_modified(past).unwrap();

        copy_manifest(&manifest_of(src.path()), dst.path());

        let copied = fs::metadata(dst.path().join("old.mtsd")).unwrap();
        assert_eq!(copied.modified().unwrap(), past);
    }

    #[cfg(unix)]
    #[test]
    fn test_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let file = src.path().join("exec.mtsd");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o750)).unwrap();

        copy_manifest(&manifest_of(src.path()), dst.path());

        let mode = fs::metadata(dst.path().join("exec.mtsd")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_failure_does_not_stop_remaining_copies() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.mtsd"), b"a").unwrap();
        fs::write(src.path().join("b.mtsd"), b"b").unwrap();
        let manifest = manifest_of(src.path());

        // A directory in the way makes the first copy fail
        fs::create_dir(dst.path().join("a.mtsd")).unwrap();

        let results = copy_manifest(&manifest, dst.path());
        assert!(!results[0].is_success());
        assert!(matches!(
            results[0].error,
            Some(SyncError::CopyIntegrityFailure { .. })
        ));
        assert!(results[1].is_success());
        assert_eq!(fs::read(dst.path().join("b.mtsd")).unwrap(), b"b");
    }

    #[test]
    fn test_source_vanished_is_failure() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.mtsd"), b"a").unwrap();
        let manifest = manifest_of(src.path());
        fs::remove_file(src.path().join("a.mtsd")).unwrap();

        let results = copy_manifest(&manifest, dst.path());
        assert!(results[0].reason().unwrap().contains("a.mtsd"));
    }
}
