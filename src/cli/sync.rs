//! `datasync sync`: run the full sync.

use crate::{
    config::SyncConfig,
    sync::{SyncOutcome, SyncRunner},
    utils::git::GitCli,
};
use anyhow::{Context, Result};

/// Run one sync and print its summary.
pub fn run_sync(config: &SyncConfig, no_push: bool) -> Result<SyncOutcome> {
    which::which("git").context("`git` not found on PATH")?;

    let git = GitCli::new(&config.sync.dest, config.git.timeout());
    let report = SyncRunner::new(config, git).push(!no_push).run();
    report.print_summary();
    Ok(report.outcome)
}
