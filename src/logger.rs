//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only printed with `--verbose`
//! - `ProgressLine` for the single-line copy counter
//!
//! # Example
//!
//! ```ignore
//! log!("copy"; "copied {}", name);
//!
//! let progress = ProgressLine::new("copy", manifest.len());
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Whether a progress line currently occupies the last terminal row
static BAR_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();

    let bar_active = BAR_ACTIVE.load(Ordering::SeqCst);
    if bar_active {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "sync" | "done" => prefix.bright_green().bold().to_string(),
        "git" => prefix.bright_blue().bold().to_string(),
        "error" | "fatal" => prefix.bright_red().bold().to_string(),
        "info" => prefix.bright_cyan().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Progress Line (single counter)
// ============================================================================

/// Single-line progress counter
///
/// Displays: `[copy] 42/69`
///
/// The line is redrawn in place when stdout is a terminal. Log lines emitted
/// while the counter is active clear it first, and the next `inc` redraws it.
pub struct ProgressLine {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
    interactive: bool,
}

impl ProgressLine {
    /// Create a progress counter for `total` items.
    pub fn new(name: &'static str, total: usize) -> Self {
        let interactive = stdout().is_terminal();
        BAR_ACTIVE.store(interactive, Ordering::SeqCst);

        let progress = Self {
            name,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
            interactive,
        };
        progress.display(false);
        progress
    }

    /// Advance the counter by one.
    #[inline]
    pub fn inc(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        if self.lock.try_lock().is_some() {
            self.display(false);
        }
    }

    /// Current counter value.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    fn display(&self, newline: bool) {
        if !self.interactive {
            return;
        }

        let line = format!("{}/{}", self.current(), self.total);
        let prefix = colorize_prefix(self.name, self.name);

        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        if newline {
            writeln!(stdout, "{prefix} {line}").ok();
        } else {
            write!(stdout, "{prefix} {line}").ok();
        }
        stdout.flush().ok();
    }

    /// Finish progress display, keep the final count and move to next line.
    pub fn finish(self) {
        BAR_ACTIVE.store(false, Ordering::SeqCst);
        {
            let _guard = self.lock.lock();
            self.display(true);
        }
        std::mem::forget(self); // Prevent Drop from clearing
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_ACTIVE.store(false, Ordering::SeqCst);
        if !self.interactive {
            return;
        }

        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts() {
        let progress = ProgressLine::new("copy", 3);
        progress.inc();
        progress.inc();
        assert_eq!(progress.current(), 2);
        progress.finish();
        assert!(!BAR_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn test_prefix_contains_module() {
        let prefix = colorize_prefix("git", "git");
        assert!(prefix.contains("[git]"));
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
