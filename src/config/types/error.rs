//! Configuration error types.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config file `{0}` not found, run `datasync init` to create one")]
    NotFound(PathBuf),

    // NOTE: No #[from] here - we don't want source() which causes duplicate output
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

// ============================================================================
// ConfigDiagnostic
// ============================================================================

/// Whether a diagnostic blocks loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single problem found in one config field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    /// Config field path (e.g., "sync.source")
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl ConfigDiagnostic {
    fn new(severity: Severity, field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            severity,
            field,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

// ============================================================================
// ConfigDiagnostics
// ============================================================================

/// Problems collected while validating every section, reported together.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    items: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.items
            .push(ConfigDiagnostic::new(Severity::Error, field, message));
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items
            .push(ConfigDiagnostic::new(Severity::Error, field, message).with_hint(hint));
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.items
            .push(ConfigDiagnostic::new(Severity::Warning, field, message));
    }

    /// Log every warning; errors are reported through `into_result`.
    pub fn print_warnings(&self) {
        for warning in self.warnings() {
            crate::log!("warning"; "{}", warning);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(ConfigDiagnostic::is_error)
    }

    pub fn errors(&self) -> Vec<&ConfigDiagnostic> {
        self.items.iter().filter(|d| d.is_error()).collect()
    }

    pub fn warnings(&self) -> Vec<&ConfigDiagnostic> {
        self.items.iter().filter(|d| !d.is_error()).collect()
    }

    /// `Err(self)` when any error was recorded; warnings alone pass.
    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors();
        write!(f, "{}", "invalid configuration:".red().bold())?;
        for err in &errors {
            write!(f, "\n{} {}", "→".red(), err)?;
        }
        if errors.len() > 1 {
            write!(f, "\n{}", format!("{} errors", errors.len()).dimmed())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}
