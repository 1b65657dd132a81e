//! Command-line interface module.

mod args;
pub mod check;
pub mod init;
pub mod sync;

pub use args::{Cli, Commands, PathArgs};
