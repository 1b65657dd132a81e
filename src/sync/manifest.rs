//! Selection of source files to copy.

use super::SyncError;
use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};

/// Canonical form of a configured extension: trimmed, without leading dots,
/// lowercased the same way file names are compared. `None` if nothing is left.
pub fn fold_extension(ext: &str) -> Option<String> {
    let folded = ext.trim().trim_start_matches('.').to_lowercase();
    (!folded.is_empty()).then_some(folded)
}

/// Case-insensitive file extension filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    /// Lowercase suffixes including the leading dot, e.g. `.mtsd`.
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    /// Build from extensions given with or without a leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = extensions
            .into_iter()
            .filter_map(|e| fold_extension(e.as_ref()))
            .map(|e| format!(".{e}"))
            .collect();
        Self { suffixes }
    }

    /// Whether `name` ends with one of the extensions and has a stem before it.
    pub fn matches(&self, name: &OsStr) -> bool {
        let lower = name.to_string_lossy().to_lowercase();
        self.suffixes
            .iter()
            .any(|s| lower.len() > s.len() && lower.ends_with(s.as_str()))
    }
}

impl std::fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.suffixes.join(", "))
    }
}

/// One selected source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: OsString,
    pub size: u64,
}

impl ManifestEntry {
    pub fn display_name(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }
}

/// Source files selected for one run, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileManifest {
    dir: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl FileManifest {
    /// List regular files directly inside `dir` that pass `filter`.
    ///
    /// Subdirectories are not descended into. Symlinks to files count as files.
    pub fn scan(dir: &Path, filter: &ExtensionFilter) -> Result<Self, SyncError> {
        let read_err = |source| SyncError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let file_name = entry.file_name();
            if !filter.matches(&file_name) {
                continue;
            }
            // Follows symlinks; dangling links are skipped
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => entries.push(ManifestEntry {
                    file_name,
                    size: meta.len(),
                }),
                _ => continue,
            }
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(ManifestEntry::display_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, content: &[u8]) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_filter_case_insensitive() {
        let filter = ExtensionFilter::new([".mtsd"]);
        assert!(filter.matches(OsStr::new("a.mtsd")));
        assert!(filter.matches(OsStr::new("b.MTSD")));
        assert!(!filter.matches(OsStr::new("c.txt")));
        assert!(!filter.matches(OsStr::new("mtsd")));
        assert!(!filter.matches(OsStr::new(".mtsd")));
        assert!(!filter.matches(OsStr::new("a.mtsd.bak")));
    }

    #[test]
    fn test_filter_multiple_and_compound() {
        let filter = ExtensionFilter::new(["CSV", "tar.gz", ""]);
        assert!(filter.matches(OsStr::new("x.csv")));
        assert!(filter.matches(OsStr::new("x.TAR.GZ")));
        assert!(!filter.matches(OsStr::new("x.gz")));
        assert_eq!(filter.to_string(), ".csv, .tar.gz");
    }

    #[test]
    fn test_filter_folds_non_ascii_extensions() {
        let filter = ExtensionFilter::new(["ÄBC"]);
        assert!(filter.matches(OsStr::new("x.äbc")));
        assert!(filter.matches(OsStr::new("X.ÄBC")));
        assert_eq!(filter.to_string(), ".äbc");
    }

    #[test]
    fn test_fold_extension() {
        assert_eq!(fold_extension(" .MTSD ").as_deref(), Some("mtsd"));
        assert_eq!(fold_extension("..Äbc").as_deref(), Some("äbc"));
        assert_eq!(fold_extension("."), None);
        assert_eq!(fold_extension("  "), None);
    }

    #[test]
    fn test_empty_filter() {
        let filter = ExtensionFilter::new(Vec::<String>::new());
        assert_eq!(filter.to_string(), "");
        assert!(!filter.matches(OsStr::new("a.mtsd")));
    }

    #[test]
    fn test_scan_selects_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mtsd", b"aa");
        touch(dir.path(), "b.MTSD", b"bbb");
        touch(dir.path(), "c.txt", b"c");

        let manifest = FileManifest::scan(dir.path(), &ExtensionFilter::new(["mtsd"])).unwrap();
        assert_eq!(manifest.names(), vec!["a.mtsd", "b.MTSD"]);
        assert_eq!(manifest.total_bytes(), 5);
        assert_eq!(manifest.dir(), dir.path());
    }

    #[test]
    fn test_scan_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "deep.mtsd", b"x");
        fs::create_dir(dir.path().join("folder.mtsd")).unwrap();
        touch(dir.path(), "top.mtsd", b"x");

        let manifest = FileManifest::scan(dir.path(), &ExtensionFilter::new(["mtsd"])).unwrap();
        assert_eq!(manifest.names(), vec!["top.mtsd"]);
    }

    #[test]
    fn test_scan_sorted_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let filter = ExtensionFilter::new(["mtsd"]);
        assert!(FileManifest::scan(dir.path(), &filter).unwrap().is_empty());

        touch(dir.path(), "z.mtsd", b"");
        touch(dir.path(), "a.mtsd", b"");
        touch(dir.path(), "m.mtsd", b"");
        let manifest = FileManifest::scan(dir.path(), &filter).unwrap();
        assert_eq!(manifest.names(), vec!["a.mtsd", "m.mtsd", "z.mtsd"]);
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileManifest::scan(&dir.path().join("gone"), &ExtensionFilter::new(["mtsd"]))
            .unwrap_err();
        assert!(matches!(err, SyncError::ReadDir { .. }));
    }
}
