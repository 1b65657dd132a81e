//! Configuration section definitions.

pub mod git;
pub mod sync;

pub use git::GitConfig;
pub use sync::SyncSectionConfig;
