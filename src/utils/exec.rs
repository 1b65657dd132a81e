//! External command execution utilities.
//!
//! Provides a Builder-based API for running commands with captured output,
//! a bounded wait and output filtering.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let outcome = Cmd::new("git")
//!     .args(["push", "origin", "main"])
//!     .cwd(dest)
//!     .timeout(Duration::from_secs(120))
//!     .run()?;
//! ```

use crate::log;
use parking_lot::Mutex;
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    sync::{Arc, OnceLock},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use thiserror::Error;

/// Default upper bound on how long a command may run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long output readers may lag behind a child that exited on its own.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// How long output readers may lag behind a child killed on timeout.
const KILL_GRACE: Duration = Duration::from_millis(200);

// ============================================================================
// Errors
// ============================================================================

/// Errors produced while running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {}s", .outcome.timeout.as_secs_f32())]
    Timeout {
        command: String,
        outcome: Box<CommandOutcome>,
    },

    #[error("`{command}` failed with {status}{}", detail_suffix(.detail))]
    Failed {
        command: String,
        status: ExitStatus,
        detail: String,
        outcome: Box<CommandOutcome>,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Captured outcome, when the process ran at all.
    pub fn outcome(&self) -> Option<&CommandOutcome> {
        match self {
            Self::Timeout { outcome, .. } | Self::Failed { outcome, .. } => Some(&**outcome),
            Self::Spawn { .. } | Self::Wait { .. } => None,
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!("\n{detail}")
    }
}

// ============================================================================
// CommandOutcome
// ============================================================================

/// Everything captured from one finished (or killed) command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub argv: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed on timeout.
    pub status: Option<ExitStatus>,
    pub elapsed: Duration,
    /// The bound the command ran under.
    pub timeout: Duration,
    /// Set when a non-zero exit matched a benign pattern.
    pub benign: bool,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success())
    }

    /// Exit code, if the process exited normally.
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// Human-readable command line.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Whether stdout or stderr contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.stdout.contains(needle) || self.stderr.contains(needle)
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    timeout: Option<Duration>,
    benign: Vec<&'static str>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Bound the wait on the child process.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Treat a non-zero exit whose output contains `pattern` as informational.
    pub fn benign(mut self, pattern: &'static str) -> Self {
        self.benign.push(pattern);
        self
    }

    /// Set output filter for logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    fn argv(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    /// Execute the command and wait for it, killing it past the timeout.
    ///
    /// Returns the captured outcome on success or on a benign failure.
    pub fn run(self) -> Result<CommandOutcome, ExecError> {
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let argv = self.argv();
        let name = argv[0].clone();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: name.clone(),
            source,
        })?;

        // Drain pipes on helper threads so a chatty child never blocks on a full pipe
        let stdout_capture = Capture::spawn(child.stdout.take());
        let stderr_capture = Capture::spawn(child.stderr.take());

        let status = wait_bounded(&mut child, timeout).map_err(|source| ExecError::Wait {
            program: name.clone(),
            source,
        })?;

        // Descendants of a killed child may hold the pipes open indefinitely
        let grace = if status.is_some() { EXIT_GRACE } else { KILL_GRACE };
        let mut outcome = CommandOutcome {
            argv,
            stdout: Capture::collect(stdout_capture, grace),
            stderr: Capture::collect(stderr_capture, grace),
            status,
            elapsed: start.elapsed(),
            timeout,
            benign: false,
        };

        let command = outcome.command_line();
        let Some(status) = status else {
            return Err(ExecError::Timeout {
                command,
                outcome: Box::new(outcome),
            });
        };

        if !outcome.success() {
            if let Some(pattern) = self.benign.iter().find(|p| outcome.mentions(p)) {
                log!("info"; "{}: {}", name, pattern);
                outcome.benign = true;
                return Ok(outcome);
            }
            return Err(ExecError::Failed {
                command,
                status,
                detail: format_error(&outcome, filter),
                outcome: Box::new(outcome),
            });
        }

        filter.log(&name, outcome.stderr.trim());
        Ok(outcome)
    }
}

/// Poll the child until it exits or the deadline passes.
///
/// Returns `None` after killing a child that outlived `timeout`. A timeout too
/// large to represent as an instant never expires.
fn wait_bounded(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            // The child may exit between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Output of one pipe, accumulated by a reader thread as it arrives.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl Capture {
    fn spawn<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Self> {
        let mut reader = pipe?;
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let handle = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                }
            }
        });
        Some(Self { buf, handle })
    }

    /// Wait up to `grace` for the reader to hit EOF, then take what it has.
    ///
    /// A reader still blocked past `grace` is left to finish on its own.
    fn collect(capture: Option<Self>, grace: Duration) -> String {
        let Some(capture) = capture else {
            return String::new();
        };
        let deadline = Instant::now() + grace;
        while !capture.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if capture.handle.is_finished() {
            let _ = capture.handle.join();
        }
        let bytes = std::mem::take(&mut *capture.buf.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known progress chatter.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines of `output` that pass the filter.
    fn keep(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.should_skip(line))
            .collect()
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines = self.keep(output);
        if !lines.is_empty() {
            crate::debug!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

/// Format the detail block for a failed command.
fn format_error(outcome: &CommandOutcome, filter: &FilterRule) -> String {
    let mut msg = filter.keep(&outcome.stderr).join("\n");

    let stdout = outcome.stdout.trim();
    if !stdout.is_empty() {
        if !msg.is_empty() {
            msg.push('\n');
        }
        msg.push_str("stdout:\n");
        msg.push_str(stdout);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
