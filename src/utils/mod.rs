//! Shared utilities.

mod hash;
pub mod process;

pub use hash::content_hash;
pub use process::{run_command, CommandOutput, CommandSpec};
