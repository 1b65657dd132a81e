//! `datasync check`: validate without modifying anything.

use crate::{
    config::SyncConfig,
    log,
    sync::{SyncOutcome, SyncRunner},
    utils::{
        fmt::{format_bytes, plural_count},
        git::GitCli,
    },
};
use anyhow::Result;

/// Check preconditions and print the files a sync would copy.
pub fn run_check(config: &SyncConfig) -> Result<SyncOutcome> {
    let sync = &config.sync;
    log!("check"; "source: {}", sync.source.display());
    log!("check"; "dest:   {}", sync.dest.display());
    log!("check"; "push:   {}/{}", config.git.remote, config.git.branch);

    if which::which("git").is_err() {
        log!("error"; "`git` not found on PATH");
        return Ok(SyncOutcome::Failed);
    }

    let git = GitCli::new(&sync.dest, config.git.timeout());
    let manifest = match SyncRunner::new(config, git).plan() {
        Ok(manifest) => manifest,
        Err(err) => {
            log!("error"; "{}", err.report());
            return Ok(SyncOutcome::Failed);
        }
    };

    for entry in manifest.entries() {
        log!("check"; "{} ({})", entry.display_name(), format_bytes(entry.size));
    }
    if manifest.is_empty() {
        log!("check"; "no matching files, a sync would do nothing");
        return Ok(SyncOutcome::NothingToSync);
    }

    log!(
        "check";
        "{} ready to sync ({})",
        plural_count(manifest.len(), "file"),
        format_bytes(manifest.total_bytes())
    );
    Ok(SyncOutcome::Synced)
}
