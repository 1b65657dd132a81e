//! Preconditions checked before anything is modified.

use super::SyncError;
use crate::utils::{git::is_working_copy, path::normalize_path};
use std::path::Path;

/// Fail unless `source` and `dest` are directories, `source` lies outside
/// `dest`, and `dest` is a git working copy.
pub fn check_preconditions(source: &Path, dest: &Path) -> Result<(), SyncError> {
    require_dir("source", source)?;
    require_dir("destination", dest)?;
    require_outside(source, dest)?;
    if !is_working_copy(dest) {
        return Err(SyncError::NotAVersionControlRepo(dest.to_path_buf()));
    }
    Ok(())
}

fn require_dir(role: &'static str, path: &Path) -> Result<(), SyncError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SyncError::PathNotFound {
            role,
            path: path.to_path_buf(),
        })
    }
}

/// Cleanup would wipe a source nested in (or equal to) the destination.
fn require_outside(source: &Path, dest: &Path) -> Result<(), SyncError> {
    let source = normalize_path(source);
    let dest = normalize_path(dest);
    if source.starts_with(&dest) {
        return Err(SyncError::SourceInsideDestination {
            source_dir: source,
            dest,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_preconditions(&dir.path().join("nope"), dir.path()).unwrap_err();
        assert!(matches!(err, SyncError::PathNotFound { role: "source", .. }));
    }

    #[test]
    fn test_missing_dest() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_preconditions(dir.path(), &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::PathNotFound { role: "destination", .. }));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(check_preconditions(&file, dir.path()).is_err());
    }

    #[test]
    fn test_dest_without_repo() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let err = check_preconditions(src.path(), dst.path()).unwrap_err();
        assert!(matches!(err, SyncError::NotAVersionControlRepo(_)));
    }

    #[test]
    fn test_source_inside_dest_is_rejected() {
        let dst = tempfile::tempdir().unwrap();
        gix::init(dst.path()).unwrap();
        let src = dst.path().join("incoming");
        std::fs::create_dir(&src).unwrap();

        let err = check_preconditions(&src, dst.path()).unwrap_err();
        assert!(matches!(err, SyncError::SourceInsideDestination { .. }));
    }

    #[test]
    fn test_source_equal_to_dest_is_rejected() {
        let dst = tempfile::tempdir().unwrap();
        gix::init(dst.path()).unwrap();
        let err = check_preconditions(dst.path(), dst.path()).unwrap_err();
        assert!(matches!(err, SyncError::SourceInsideDestination { .. }));
    }

    #[test]
    fn test_valid_working_copy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        gix::init(dst.path()).unwrap();
        assert!(check_preconditions(src.path(), dst.path()).is_ok());
    }
}
