//! Command execution module
//!
//! Provides the host-shell [`ShellRunner`](crate::script::ShellRunner) with:
//! - Timeout support
//! - Output capture and truncation
//! - Environment variable injection
//! - Per-command working directory

pub mod runner;

pub use runner::*;
