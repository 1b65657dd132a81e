//! Publish phase: stage, commit, push.

use super::{SyncError, error::Step};
use crate::{
    config::GitConfig,
    log,
    utils::{
        date::DateTimeUtc,
        git::{CommitOutcome, Vcs},
    },
};

/// How the commit step ended.
#[derive(Debug)]
pub enum CommitStatus {
    Recorded(CommitOutcome),
    /// Commit failed but the run went on to push.
    Tolerated(SyncError),
}

/// What the publish phase did.
#[derive(Debug)]
pub struct PublishReport {
    pub commit: CommitStatus,
    /// Where the push went, e.g. `git@host:org/data.git (main)`; `None` when skipped.
    pub pushed_to: Option<String>,
}

/// Stage everything, commit with a timestamped message and push.
///
/// Stage and push failures are fatal. A commit with nothing to record, or a
/// commit that fails outright, is logged and the push still runs. Timeouts are
/// fatal at every step.
pub fn publish<V: Vcs>(vcs: &V, git: &GitConfig, push: bool) -> Result<PublishReport, SyncError> {
    vcs.stage_all()
        .map_err(|e| SyncError::from_exec(Step::Stage, e))?;
    log!("git"; "staged changes");

    let message = git.render_message(&format!("{} UTC", DateTimeUtc::now().to_timestamp()));
    let commit = match vcs.commit(&message) {
        Ok(CommitOutcome::Committed) => {
            log!("git"; "committed: {}", message);
            CommitStatus::Recorded(CommitOutcome::Committed)
        }
        Ok(CommitOutcome::NothingToCommit) => {
            log!("info"; "nothing to commit, working copy already up to date");
            CommitStatus::Recorded(CommitOutcome::NothingToCommit)
        }
        Err(e) if e.is_timeout() => return Err(SyncError::from_exec(Step::Commit, e)),
        Err(e) => {
            let err = SyncError::from_exec(Step::Commit, e);
            log!("warning"; "{}, pushing anyway", err.report());
            CommitStatus::Tolerated(err)
        }
    };

    if !push {
        log!("git"; "push skipped");
        return Ok(PublishReport {
            commit,
            pushed_to: None,
        });
    }

    vcs.push(&git.remote, &git.branch)
        .map_err(|e| SyncError::from_exec(Step::Push, e))?;

    let url = vcs
        .remote_url(&git.remote)
        .unwrap_or_else(|| git.remote.clone());
    Ok(PublishReport {
        commit,
        pushed_to: Some(format!("{url} ({})", git.branch)),
    })
}
