//! `datasync init`: write a starter config file.

use crate::{config::section::git::TIMESTAMP_PLACEHOLDER, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Generate the config file content with comments.
pub fn generate_config_template() -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# datasync configuration file (v{})\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str("# Relative paths resolve against the directory holding this file.\n\n");

    out.push_str("[sync]\n");
    out.push_str("# Directory holding the data files\n");
    out.push_str("source = \"data\"\n");
    out.push_str("# Git working copy to mirror into (everything but `preserve` is deleted)\n");
    out.push_str("dest = \"repo\"\n");
    out.push_str("# File extensions to copy, matched case-insensitively\n");
    out.push_str("extensions = [\"mtsd\"]\n");
    out.push_str("# Top-level names in `dest` that survive cleanup\n");
    out.push_str("preserve = [\".git\", \"README.md\", \".gitignore\", \"datasync.toml\"]\n\n");

    out.push_str("[git]\n");
    out.push_str("remote = \"origin\"\n");
    out.push_str("branch = \"main\"\n");
    out.push_str("# Seconds before a git command is killed\n");
    out.push_str("timeout = 120\n");
    out.push_str(&format!(
        "# {TIMESTAMP_PLACEHOLDER} expands to the current UTC time\n"
    ));
    out.push_str(&format!("message = \"Update data: {TIMESTAMP_PLACEHOLDER}\"\n"));

    out
}

/// Write the starter config to `path`, refusing to overwrite unless `force`.
pub fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "'{}' already exists.\n\
             Use `datasync init --force` to overwrite it.",
            path.display()
        );
    }

    fs::write(path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}
