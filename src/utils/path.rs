//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `expand_path` - tilde expansion, resolved against a base directory

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand a leading `~` and resolve relative paths against `base`.
///
/// # Example
/// ```ignore
/// let dest = expand_path(Path::new("~/repos/data"), config_dir);
/// ```
pub fn expand_path(path: &Path, base: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
    let full = if expanded.is_relative() {
        base.join(expanded)
    } else {
        expanded
    };
    normalize_path(&full)
}
