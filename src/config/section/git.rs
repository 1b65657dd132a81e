//! `[git]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [git]
//! remote = "origin"
//! branch = "main"
//! timeout = 120                       # seconds per git command
//! message = "Update data: {timestamp}"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const REMOTE: FieldPath = FieldPath::new("git.remote");
pub const BRANCH: FieldPath = FieldPath::new("git.branch");
pub const TIMEOUT: FieldPath = FieldPath::new("git.timeout");
pub const MESSAGE: FieldPath = FieldPath::new("git.message");

/// Longest accepted per-command timeout, in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Placeholder replaced with the UTC time in commit messages.
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// How the destination is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Remote to push to.
    pub remote: String,

    /// Remote branch receiving the push.
    pub branch: String,

    /// Upper bound, in seconds, on each git command.
    pub timeout: u64,

    /// Commit message template; `{timestamp}` expands to the current UTC time.
    pub message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            timeout: 120,
            message: format!("Update data: {TIMESTAMP_PLACEHOLDER}"),
        }
    }
}

impl GitConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Commit message with the placeholder filled in.
    pub fn render_message(&self, timestamp: &str) -> String {
        self.message.replace(TIMESTAMP_PLACEHOLDER, timestamp)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.remote.trim().is_empty() {
            diag.error(REMOTE, "remote must not be empty");
        }
        if self.branch.trim().is_empty() {
            diag.error_with_hint(BRANCH, "branch must not be empty", "e.g. branch = \"main\"");
        } else if self.branch.chars().any(char::is_whitespace) {
            diag.error(BRANCH, format!("invalid branch name `{}`", self.branch));
        }
        if self.timeout == 0 {
            diag.error(TIMEOUT, "timeout must be at least 1 second");
        } else if self.timeout > MAX_TIMEOUT_SECS {
            diag.error_with_hint(
                TIMEOUT,
                format!("timeout of {}s is too large", self.timeout),
                format!("use at most {MAX_TIMEOUT_SECS} seconds"),
            );
        }
        if self.render_message("").trim().is_empty() {
            diag.error(MESSAGE, "commit message template produces an empty message");
        } else if !self.message.contains(TIMESTAMP_PLACEHOLDER) {
            diag.warn(MESSAGE, "no {timestamp} placeholder, every commit gets the same message");
        }
    }
}
