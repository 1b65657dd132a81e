//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Mirror a directory of data files into a git working copy and push it
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: datasync.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "datasync.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clear the destination, copy matching files, commit and push
    #[command(visible_alias = "s")]
    Sync {
        #[command(flatten)]
        paths: PathArgs,

        /// Commit locally but do not push
        #[arg(long)]
        no_push: bool,
    },

    /// Validate configuration and preconditions, list the files that would be copied
    #[command(visible_alias = "c")]
    Check {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Write a starter config file in the current directory
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

/// Overrides for the config file, shared by `sync` and `check`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Source directory holding the data files
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Destination git working copy
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dest: Option<PathBuf>,

    /// Remote branch to push to
    #[arg(short, long)]
    pub branch: Option<String>,
}

impl PathArgs {
    /// Whether the command line alone names both directories.
    pub const fn is_complete(&self) -> bool {
        self.source.is_some() && self.dest.is_some()
    }
}

impl Cli {
    /// Path overrides of the selected command, if it takes any.
    pub const fn path_args(&self) -> Option<&PathArgs> {
        match &self.command {
            Commands::Sync { paths, .. } | Commands::Check { paths } => Some(paths),
            Commands::Init { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_with_overrides() {
        let cli = Cli::try_parse_from([
            "datasync", "sync", "--source", "/data", "--dest", "/repo", "-b", "gh-pages", "--no-push",
        ])
        .unwrap();
        let Commands::Sync { paths, no_push } = &cli.command else {
            panic!("expected sync");
        };
        assert!(*no_push);
        assert!(paths.is_complete());
        assert_eq!(paths.branch.as_deref(), Some("gh-pages"));
        assert_eq!(cli.config, PathBuf::from("datasync.toml"));
    }

    #[test]
    fn test_parse_alias_and_global_flags() {
        let cli = Cli::try_parse_from(["datasync", "c", "-v", "-C", "other.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { .. }));
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(!cli.path_args().unwrap().is_complete());
    }

    #[test]
    fn test_init_has_no_path_args() {
        let cli = Cli::try_parse_from(["datasync", "init", "--force"]).unwrap();
        assert!(cli.path_args().is_none());
    }
}
