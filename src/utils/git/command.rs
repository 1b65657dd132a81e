use super::{CommitOutcome, Vcs};
use crate::{
    debug, log,
    utils::exec::{Cmd, CommandOutcome, ExecError, FilterRule},
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Progress chatter git prints on push.
const PUSH_FILTER: FilterRule = FilterRule::new(&["remote:", "To ", "Enumerating", "Counting"]);

/// Text git prints when a commit has nothing to record.
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// [`Vcs`] backed by the `git` command line, run inside the working copy.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(root: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git<I, S>(&self, args: I) -> Cmd
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Cmd::new("git")
            .args(args)
            .cwd(&self.root)
            .timeout(self.timeout)
            .envs([("GIT_TERMINAL_PROMPT", "0")])
    }

    /// Whether the index differs from HEAD.
    ///
    /// `git diff --cached --quiet` exits 1 when there are staged changes.
    pub fn has_staged_changes(&self) -> Result<bool, ExecError> {
        match self.git(["diff", "--cached", "--quiet"]).run() {
            Ok(_) => Ok(false),
            Err(e) if e.outcome().and_then(CommandOutcome::code) == Some(1) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Whether HEAD points at a commit yet.
    fn has_head(&self) -> bool {
        self.git(["rev-parse", "--verify", "-q", "HEAD"]).run().is_ok()
    }
}

impl Vcs for GitCli {
    fn stage_all(&self) -> Result<CommandOutcome, ExecError> {
        self.git(["add", "--all", "."]).run()
    }

    fn commit(&self, message: &str) -> Result<CommitOutcome, ExecError> {
        // An unborn branch has no HEAD to diff against; let commit decide.
        if self.has_head() && !self.has_staged_changes()? {
            return Ok(CommitOutcome::NothingToCommit);
        }

        let outcome = self
            .git(["commit", "-q", "-m", message])
            .benign(NOTHING_TO_COMMIT)
            .run()?;

        if outcome.benign {
            return Ok(CommitOutcome::NothingToCommit);
        }
        debug!("git"; "committed in {:.2}s", outcome.elapsed.as_secs_f32());
        Ok(CommitOutcome::Committed)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutcome, ExecError> {
        let refspec = format!("HEAD:{branch}");
        let outcome = self
            .git(["push", remote, refspec.as_str()])
            .filter(&PUSH_FILTER)
            .run()?;
        log!("git"; "pushed to {remote}/{branch}");
        Ok(outcome)
    }

    fn remote_url(&self, remote: &str) -> Option<String> {
        let outcome = self.git(["remote", "get-url", remote]).run().ok()?;
        let url = outcome.stdout.trim();
        (!url.is_empty()).then(|| url.to_string())
    }
}
