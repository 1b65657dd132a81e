//! Run outcome and console summary.

use super::{
    SyncError,
    clean::CleanReport,
    copy::CopyResult,
    publish::{CommitStatus, PublishReport},
};
use crate::{
    log,
    utils::{
        fmt::{format_bytes, plural_count},
        git::CommitOutcome,
    },
};
use std::{path::PathBuf, process::ExitCode};

/// Overall result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every matched file was copied and published.
    Synced,
    /// Some copies failed; the successful ones were published.
    Partial,
    /// No source file matched the filter; nothing was touched.
    NothingToSync,
    /// The run halted on a fatal error.
    Failed,
}

impl SyncOutcome {
    pub const fn code(self) -> u8 {
        match self {
            Self::Synced => 0,
            Self::Failed => 1,
            Self::Partial => 2,
            Self::NothingToSync => 3,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Everything a run produced, for the final summary.
#[derive(Debug)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub dest: PathBuf,
    pub matched: usize,
    pub cleanup: Option<CleanReport>,
    pub copies: Vec<CopyResult>,
    pub publish: Option<PublishReport>,
    /// The error that halted the run, or the no-op reason.
    pub error: Option<SyncError>,
}

impl SyncReport {
    pub(super) fn new(dest: PathBuf) -> Self {
        Self {
            outcome: SyncOutcome::Failed,
            dest,
            matched: 0,
            cleanup: None,
            copies: Vec::new(),
            publish: None,
            error: None,
        }
    }

    /// Close the report as halted by `err`.
    pub(super) fn halt(mut self, outcome: SyncOutcome, err: SyncError) -> Self {
        self.outcome = outcome;
        self.error = Some(err);
        self
    }

    pub fn copied(&self) -> usize {
        self.copies.iter().filter(|c| c.is_success()).count()
    }

    pub fn failed_copies(&self) -> impl Iterator<Item = &CopyResult> {
        self.copies.iter().filter(|c| !c.is_success())
    }

    pub fn bytes_copied(&self) -> u64 {
        self.copies
            .iter()
            .filter(|c| c.is_success())
            .map(|c| c.bytes)
            .sum()
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self) {
        match self.outcome {
            SyncOutcome::NothingToSync => {
                if let Some(err) = &self.error {
                    log!("sync"; "nothing to sync: {}", err);
                }
                return;
            }
            SyncOutcome::Failed => {
                if let Some(err) = &self.error {
                    log!("fatal"; "{}", err.report());
                }
            }
            SyncOutcome::Synced | SyncOutcome::Partial => {}
        }

        if self.matched > 0 {
            log!(
                "sync";
                "matched {}, copied {} ({})",
                plural_count(self.matched, "file"),
                self.copied(),
                format_bytes(self.bytes_copied())
            );
        }
        for failed in self.failed_copies() {
            if let Some(reason) = failed.reason() {
                log!("warning"; "{}", reason);
            }
        }
        if let Some(cleanup) = &self.cleanup
            && !cleanup.failures.is_empty()
        {
            log!("warning"; "{} could not be removed", plural_count(cleanup.failures.len(), "entry"));
        }

        if let Some(publish) = &self.publish {
            let commit = match &publish.commit {
                CommitStatus::Recorded(CommitOutcome::Committed) => "new commit".to_string(),
                CommitStatus::Recorded(CommitOutcome::NothingToCommit) => "no changes".to_string(),
                CommitStatus::Tolerated(err) => format!("commit failed ({err})"),
            };
            match &publish.pushed_to {
                Some(target) => log!("git"; "{}, pushed to {}", commit, target),
                None => log!("git"; "{}, not pushed", commit),
            }
        }

        match self.outcome {
            SyncOutcome::Synced => log!("done"; "synced to {}", self.dest.display()),
            SyncOutcome::Partial => {
                log!("done"; "partially synced to {}", self.dest.display());
            }
            SyncOutcome::Failed => log!("error"; "sync failed, nothing was published"),
            SyncOutcome::NothingToSync => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(name: &str, bytes: u64, ok: bool) -> CopyResult {
        CopyResult {
            name: name.into(),
            bytes,
            error: (!ok).then(|| SyncError::CopyIntegrityFailure {
                name: name.into(),
                reason: "size mismatch".into(),
            }),
        }
    }

    #[test]
    fn test_exit_codes_distinct() {
        let codes = [
            SyncOutcome::Synced.code(),
            SyncOutcome::Failed.code(),
            SyncOutcome::Partial.code(),
            SyncOutcome::NothingToSync.code(),
        ];
        assert_eq!(codes, [0, 1, 2, 3]);
    }

    #[test]
    fn test_counts() {
        let mut report = SyncReport::new("/repo".into());
        report.matched = 3;
        report.copies = vec![copy("a", 10, true), copy("b", 5, false), copy("c", 7, true)];
        assert_eq!(report.copied(), 2);
        assert_eq!(report.bytes_copied(), 17);
        assert_eq!(report.failed_copies().count(), 1);
    }

    #[test]
    fn test_halt_sets_outcome_and_error() {
        let report = SyncReport::new("/repo".into()).halt(
            SyncOutcome::NothingToSync,
            SyncError::EmptyManifest {
                dir: "/data".into(),
                extensions: ".mtsd".into(),
            },
        );
        assert_eq!(report.outcome, SyncOutcome::NothingToSync);
        assert!(report.error.is_some());
        report.print_summary();
    }
}
