//! Telemetry snapshot editor CLI library.
//!
//! This crate provides the CLI interface for snapedit.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EditAction, NamespaceArgs};
pub use config::Config;
