use anyhow::{Context, Result, bail};
use gix::ThreadSafeRepository;
use std::path::Path;

/// Name of the version-control marker inside a working copy.
pub const GIT_MARKER: &str = ".git";

/// Open an existing non-bare repository rooted at `root`.
pub fn open_repo(root: &Path) -> Result<ThreadSafeRepository> {
    let repo = gix::open(root)
        .with_context(|| format!("`{}` is not a git repository", root.display()))?;
    if repo.is_bare() {
        bail!("`{}` is a bare repository", root.display());
    }
    Ok(repo.into_sync())
}

/// Whether `root` carries a `.git` marker and opens as a working copy.
pub fn is_working_copy(root: &Path) -> bool {
    root.join(GIT_MARKER).exists() && open_repo(root).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::git::testing::{git_available, init_repo};

    #[test]
    fn test_plain_dir_is_not_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_working_copy(dir.path()));
        assert!(open_repo(dir.path()).is_err());
    }

    #[test]
    fn test_fake_marker_is_not_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(GIT_MARKER)).unwrap();
        assert!(!is_working_copy(dir.path()));
    }

    #[test]
    fn test_initialized_repo_is_working_copy() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        assert!(is_working_copy(dir.path()));
    }
}
