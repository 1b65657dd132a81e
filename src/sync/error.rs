//! Error taxonomy of a sync run.

use crate::utils::exec::ExecError;
use std::{fmt, io, path::PathBuf, time::Duration};
use thiserror::Error;

/// Publish step that ran an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stage,
    Commit,
    Push,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stage => "add",
            Self::Commit => "commit",
            Self::Push => "push",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{role} directory not found: {}", .path.display())]
    PathNotFound { role: &'static str, path: PathBuf },

    #[error("`{}` is not a git working copy", .0.display())]
    NotAVersionControlRepo(PathBuf),

    #[error(
        "source `{}` lies inside the destination `{}`",
        .source_dir.display(),
        .dest.display()
    )]
    SourceInsideDestination { source_dir: PathBuf, dest: PathBuf },

    #[error("failed to read `{}`", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove `{}`: {source}", .path.display())]
    CleanupEntryFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("copy of `{name}` failed: {reason}")]
    CopyIntegrityFailure { name: String, reason: String },

    #[error("all {failed} copies failed")]
    AllCopiesFailed { failed: usize },

    #[error("no files with extension {extensions} in `{}`", .dir.display())]
    EmptyManifest { dir: PathBuf, extensions: String },

    #[error("git {step} timed out after {}s", .timeout.as_secs())]
    CommandTimeout { step: Step, timeout: Duration },

    #[error("git {step} failed")]
    CommandFailure {
        step: Step,
        #[source]
        source: ExecError,
    },
}

impl SyncError {
    /// Classify a failed publish command.
    pub fn from_exec(step: Step, err: ExecError) -> Self {
        match err {
            ExecError::Timeout { outcome, .. } => Self::CommandTimeout {
                step,
                timeout: outcome.timeout,
            },
            other => Self::CommandFailure { step, source: other },
        }
    }

    /// Error message followed by its source chain.
    pub fn report(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !msg.contains(&text) {
                msg.push_str("\n  caused by: ");
                msg.push_str(&text);
            }
            source = err.source();
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::exec::Cmd;

    #[test]
    fn test_step_display() {
        assert_eq!(Step::Stage.to_string(), "add");
        assert_eq!(Step::Push.to_string(), "push");
    }

    #[cfg(unix)]
    #[test]
    fn test_from_exec_timeout() {
        let err = Cmd::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100))
            .run()
            .unwrap_err();
        let sync_err = SyncError::from_exec(Step::Push, err);
        assert!(matches!(
            sync_err,
            SyncError::CommandTimeout { step: Step::Push, .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_exec_failure_report_includes_cause() {
        let err = Cmd::new("sh")
            .args(["-c", "echo rejected >&2; exit 1"])
            .run()
            .unwrap_err();
        let sync_err = SyncError::from_exec(Step::Push, err);
        let report = sync_err.report();
        assert!(report.starts_with("git push failed"));
        assert!(report.contains("rejected"));
    }
}
