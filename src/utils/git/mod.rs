//! Git operations for publishing the destination working copy.
//!
//! The sync runner talks to version control through the [`Vcs`] trait so the
//! publish sequence can be exercised without a network remote.

mod command;
mod repo;

pub use command::GitCli;
pub use repo::{GIT_MARKER, is_working_copy};

use crate::utils::exec::{CommandOutcome, ExecError};

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was recorded.
    Committed,
    /// The index had no changes to record.
    NothingToCommit,
}

/// Version-control operations used by the publish phase.
pub trait Vcs {
    /// Stage every change in the working copy, including deletions.
    fn stage_all(&self) -> Result<CommandOutcome, ExecError>;

    /// Record staged changes with `message`.
    fn commit(&self, message: &str) -> Result<CommitOutcome, ExecError>;

    /// Push the current branch to `remote`/`branch`.
    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutcome, ExecError>;

    /// URL configured for `remote`, if it can be resolved.
    fn remote_url(&self, remote: &str) -> Option<String>;
}
