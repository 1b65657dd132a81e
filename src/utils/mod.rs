//! Utility modules shared by the sync runner and the CLI.

pub mod date;
pub mod exec;
pub mod fmt;
pub mod git;
pub mod path;
