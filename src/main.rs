//! datasync - mirror a directory of data files into a git working copy.

mod cli;
mod config;
mod logger;
mod sync;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SyncConfig;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let outcome = match &cli.command {
        Commands::Init { force } => {
            cli::init::write_config(&cli.config, *force)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Sync { no_push, .. } => cli::sync::run_sync(&SyncConfig::load(&cli)?, *no_push)?,
        Commands::Check { .. } => cli::check::run_check(&SyncConfig::load(&cli)?)?,
    };

    Ok(outcome.exit_code())
}
