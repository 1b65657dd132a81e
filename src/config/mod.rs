//! Sync configuration management for `datasync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── git        # [git]
//! │   └── sync       # [sync]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # SyncConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section   | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `[sync]`  | Source, destination, extension filter, preserve set |
//! | `[git]`   | Remote, branch, command timeout, commit message     |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{GitConfig, SyncSectionConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, PathArgs},
    debug, log,
    utils::path::expand_path,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing datasync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative config paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// What to mirror and where
    #[serde(default)]
    pub sync: SyncSectionConfig,

    /// How to publish
    #[serde(default)]
    pub git: GitConfig,
}

impl SyncConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file. Without one, the command
    /// line must name both `--source` and `--dest`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let overrides = cli.path_args().cloned().unwrap_or_default();

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                config
            }
            None if overrides.is_complete() => {
                debug!("config"; "no config file, using defaults");
                Self {
                    root: cwd.clone(),
                    ..Self::default()
                }
            }
            None => bail!(ConfigError::NotFound(cli.config.clone())),
        };

        config.finalize(&overrides, &cwd);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", name, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Resolve paths and apply command-line overrides.
    ///
    /// File values resolve against the config directory, CLI values against `cwd`.
    fn finalize(&mut self, overrides: &PathArgs, cwd: &Path) {
        self.normalize_paths();
        self.apply_overrides(overrides, cwd);
        self.preserve_own_config();
    }

    fn normalize_paths(&mut self) {
        for path in [&mut self.sync.source, &mut self.sync.dest] {
            if !path.as_os_str().is_empty() {
                *path = expand_path(path, &self.root);
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &PathArgs, cwd: &Path) {
        if let Some(source) = &overrides.source {
            self.sync.source = expand_path(source, cwd);
        }
        if let Some(dest) = &overrides.dest {
            self.sync.dest = expand_path(dest, cwd);
        }
        Self::update_option(&mut self.git.branch, overrides.branch.as_ref());
    }

    /// A config file kept inside the destination must survive cleanup.
    fn preserve_own_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if path.parent() != Some(self.sync.dest.as_path()) {
            return;
        }
        if let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
            && !self.sync.preserve.contains(&name)
        {
            debug!("config"; "preserving {} in destination", name);
            self.sync.preserve.push(name);
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate all sections, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.sync.validate(&mut diag);
        self.git.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SyncConfig {
    let (parsed, ignored) = SyncConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invalid_toml() {
        assert!(SyncConfig::parse_with_ignored("[sync\nsource = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[sync]\nsource = \"/a\"\n[unknown_section]\nfield = 1\n[git]\nbrnch = \"x\"";
        let (config, ignored) = SyncConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.sync.source, PathBuf::from("/a"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
        assert!(ignored.iter().any(|f| f.contains("brnch")));
    }

    #[test]
    fn test_finalize_resolves_relative_to_root() {
        let mut config = test_parse_config("[sync]\nsource = \"data\"\ndest = \"/abs/repo\"");
        config.root = PathBuf::from("/no/such/root");
        config.finalize(&PathArgs::default(), Path::new("/cwd"));
        assert_eq!(config.sync.source, PathBuf::from("/no/such/root/data"));
        assert_eq!(config.sync.dest, PathBuf::from("/abs/repo"));
    }

    #[test]
    fn test_overrides_win_and_resolve_against_cwd() {
        let mut config = test_parse_config("[sync]\nsource = \"/a\"\ndest = \"/b\"\n[git]\nbranch = \"main\"");
        config.root = PathBuf::from("/root");
        let overrides = PathArgs {
            source: Some("in".into()),
            dest: None,
            branch: Some("gh-pages".into()),
        };
        config.finalize(&overrides, Path::new("/no/such/cwd"));
        assert_eq!(config.sync.source, PathBuf::from("/no/such/cwd/in"));
        assert_eq!(config.sync.dest, PathBuf::from("/b"));
        assert_eq!(config.git.branch, "gh-pages");
    }

    #[test]
    fn test_config_inside_dest_is_preserved() {
        let mut config = test_parse_config("[sync]\nsource = \"/a\"\ndest = \"/repo\"\npreserve = [\".git\"]");
        config.config_path = Some(PathBuf::from("/repo/mirror.toml"));
        config.finalize(&PathArgs::default(), Path::new("/"));
        assert!(config.sync.preserve.contains(&"mirror.toml".to_string()));
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = SyncConfig::default();
        let err = config.validate().unwrap_err();
        let ConfigError::Diagnostics(diag) = err.downcast::<ConfigError>().unwrap() else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_validate_ok() {
        let config = test_parse_config("[sync]\nsource = \"/a\"\ndest = \"/b\"");
        assert!(config.validate().is_ok());
    }
}
