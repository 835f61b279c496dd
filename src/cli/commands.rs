//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::script::ConfigEntry;

/// Operation name that `.` stands for
pub const DOT_ALIAS_TARGET: &str = "build";

/// Minimal build-script interpreter.
///
/// Runs named operations from the project's `.enderpearl` file, bracketed by
/// its `pre` and `post` operations.
#[derive(Parser, Debug)]
#[command(name = "enderpearl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub settings: Option<String>,

    /// Project root (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub root: Option<String>,

    /// Config entries in KEY=VALUE format, taking precedence over the config file
    #[arg(short = 'D', long = "define", global = true, value_parser = parse_key_value)]
    pub defines: Vec<(String, String)>,

    /// Subcommand (defaults to running the default operation)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// `-D` entries as config overrides, in command-line order
    pub fn overrides(&self) -> Vec<ConfigEntry> {
        self.defines
            .iter()
            .map(|(k, v)| ConfigEntry::new(k.clone(), v.clone()))
            .collect()
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an operation with its pre and post operations
    Run(RunArgs),

    /// List operations defined in the script
    List(ListArgs),

    /// Show resolved config entries
    Config(ListArgs),

    /// Show resolved settings
    Settings,
}

/// Arguments for the `run` subcommand
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Operation to run (`.` means build; defaults to the configured default)
    pub operation: Option<String>,

    /// Stop at the first command that exits non-zero
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-command timeout in seconds (0 for no timeout)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Capture command output and print it after each run
    #[arg(long)]
    pub capture: bool,

    /// Output format for the run summary
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Resolve the operation to run
    ///
    /// `.` is shorthand for `build`; no operation means `default`.
    pub fn operation_name(&self, default: &str) -> String {
        match self.operation.as_deref() {
            Some(".") => DOT_ALIAS_TARGET.to_string(),
            Some(name) => name.to_string(),
            None => default.to_string(),
        }
    }
}

/// Arguments for the `list` and `config` subcommands
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON output
    Json,
    /// Plain text (one item per line)
    Plain,
}

/// Parse KEY=VALUE argument
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid argument '{}': expected KEY=VALUE format", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
