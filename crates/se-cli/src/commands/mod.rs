//! CLI subcommand implementations.

pub mod apply;
pub mod edit;
pub mod util;
