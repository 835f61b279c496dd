//! CLI module for enderpearl
//!
//! Provides command-line interface with the following subcommands:
//! - `run` - Run an operation between `pre` and `post`
//! - `list` - List operations in the script
//! - `config` - Show resolved config entries
//! - `settings` - Show resolved settings

pub mod commands;

pub use commands::{Cli, Commands, ListArgs, OutputFormat, RunArgs};
