//! `[sync]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sync]
//! source = "~/data/kaggle"
//! dest = "~/repos/my-kaggle-data"
//! extensions = ["mtsd"]
//! preserve = [".git", "README.md", ".gitignore", "datasync.toml"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::sync::fold_extension;
use crate::utils::git::GIT_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const SOURCE: FieldPath = FieldPath::new("sync.source");
pub const DEST: FieldPath = FieldPath::new("sync.dest");
pub const EXTENSIONS: FieldPath = FieldPath::new("sync.extensions");
pub const PRESERVE: FieldPath = FieldPath::new("sync.preserve");

/// What to mirror and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSectionConfig {
    /// Directory holding the data files (read, never modified).
    pub source: PathBuf,

    /// Git working copy that receives the files.
    pub dest: PathBuf,

    /// File extensions to copy, matched case-insensitively. A leading dot is optional.
    pub extensions: Vec<String>,

    /// Top-level destination entries that cleanup never removes.
    pub preserve: Vec<String>,
}

impl Default for SyncSectionConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            dest: PathBuf::new(),
            extensions: vec!["mtsd".to_string()],
            preserve: [GIT_MARKER, "README.md", ".gitignore", "datasync.toml"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SyncSectionConfig {
    /// Extensions folded by [`fold_extension`], sorted and deduplicated.
    pub fn normalized_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self
            .extensions
            .iter()
            .filter_map(|e| fold_extension(e))
            .collect();
        exts.sort();
        exts.dedup();
        exts
    }

    /// Preserved names as a set.
    pub fn preserved_set(&self) -> BTreeSet<String> {
        self.preserve.iter().cloned().collect()
    }

    /// Validate the section. Paths are expected to be normalized already.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.source.as_os_str().is_empty() {
            diag.error_with_hint(SOURCE, "source directory is not set", "set `source` under [sync] or pass --source");
        }
        if self.dest.as_os_str().is_empty() {
            diag.error_with_hint(DEST, "destination working copy is not set", "set `dest` under [sync] or pass --dest");
        }
        if !self.source.as_os_str().is_empty() && !self.dest.as_os_str().is_empty() {
            if self.source == self.dest {
                diag.error(DEST, "destination must differ from source");
            } else if self.source.starts_with(&self.dest) {
                diag.error_with_hint(
                    SOURCE,
                    "source lies inside the destination, cleanup would delete it",
                    "keep the data directory outside `dest`",
                );
            }
        }

        if self.normalized_extensions().is_empty() {
            diag.error_with_hint(EXTENSIONS, "no file extensions to copy", "e.g. extensions = [\"mtsd\"]");
        }

        if !self.preserve.iter().any(|p| p == GIT_MARKER) {
            diag.error_with_hint(
                PRESERVE,
                format!("`{GIT_MARKER}` must be preserved, cleanup would delete the repository"),
                format!("add \"{GIT_MARKER}\" to preserve"),
            );
        }
        for name in &self.preserve {
            if name.contains('/') || name.contains('\\') {
                diag.warn(PRESERVE, format!("`{name}` is a path, only top-level names are matched"));
            }
        }
        if self.preserved_set().len() != self.preserve.len() {
            diag.warn(PRESERVE, "duplicate entries");
        }
    }
}
