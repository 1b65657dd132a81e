//! The sync runner.
//!
//! A run is strictly sequential:
//!
//! ```text
//! precheck → manifest → clean → copy → stage → commit → push → summary
//! ```
//!
//! Nothing is modified until the preconditions hold and the manifest is
//! known to be non-empty. Per-entry cleanup and copy failures are recorded
//! and skipped; everything else halts the run. Nothing is retried.

mod clean;
mod copy;
mod error;
mod manifest;
mod precheck;
mod publish;
mod report;

pub use error::SyncError;
pub use manifest::fold_extension;
pub use report::{SyncOutcome, SyncReport};

use clean::clean_destination;
use copy::copy_manifest;
use manifest::{ExtensionFilter, FileManifest};
use precheck::check_preconditions;
use publish::publish;

use crate::{config::SyncConfig, log, utils::fmt::plural_count, utils::git::Vcs};

/// Runs one wipe-and-replace sync of the configured source into the destination.
pub struct SyncRunner<'a, V: Vcs> {
    config: &'a SyncConfig,
    vcs: V,
    push: bool,
}

impl<'a, V: Vcs> SyncRunner<'a, V> {
    pub const fn new(config: &'a SyncConfig, vcs: V) -> Self {
        Self {
            config,
            vcs,
            push: true,
        }
    }

    /// Whether to push after committing (default: true).
    pub fn push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    #[cfg(test)]
    pub const fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Validate and list the files a run would copy, without modifying anything.
    pub fn plan(&self) -> Result<FileManifest, SyncError> {
        let sync = &self.config.sync;
        check_preconditions(&sync.source, &sync.dest)?;
        FileManifest::scan(&sync.source, &self.filter())
    }

    fn filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(self.config.sync.normalized_extensions())
    }

    /// Execute all phases and return the report. Never panics on I/O errors.
    pub fn run(&self) -> SyncReport {
        let sync = &self.config.sync;
        let mut report = SyncReport::new(sync.dest.clone());

        log!("sync"; "{} → {}", sync.source.display(), sync.dest.display());

        let manifest = match self.plan() {
            Ok(manifest) => manifest,
            Err(err) => return report.halt(SyncOutcome::Failed, err),
        };
        report.matched = manifest.len();

        if manifest.is_empty() {
            let err = SyncError::EmptyManifest {
                dir: sync.source.clone(),
                extensions: self.filter().to_string(),
            };
            return report.halt(SyncOutcome::NothingToSync, err);
        }
        log!("sync"; "found {}", plural_count(manifest.len(), "file"));

        match clean_destination(&sync.dest, &sync.preserved_set()) {
            Ok(cleanup) => {
                log!(
                    "clean";
                    "removed {}, kept {}",
                    plural_count(cleanup.removed.len(), "entry"),
                    cleanup.kept.len()
                );
                report.cleanup = Some(cleanup);
            }
            Err(err) => return report.halt(SyncOutcome::Failed, err),
        }

        report.copies = copy_manifest(&manifest, &sync.dest);
        let copied = report.copied();
        if copied == 0 {
            let failed = report.copies.len();
            return report.halt(SyncOutcome::Failed, SyncError::AllCopiesFailed { failed });
        }

        match publish(&self.vcs, &self.config.git, self.push) {
            Ok(published) => report.publish = Some(published),
            Err(err) => return report.halt(SyncOutcome::Failed, err),
        }

        report.outcome = if copied == report.copies.len() {
            SyncOutcome::Synced
        } else {
            SyncOutcome::Partial
        };
        report
    }
}
