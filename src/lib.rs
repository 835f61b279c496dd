//! enderpearl - Minimal build-script interpreter
//!
//! Reads a project's `.enderpearl` script of named operations:
//!
//! ```text
//! #pre(mkdir -p .build)
//! #build(
//!     cargo build --target ${target}
//! )
//! #post(echo done)
//! ```
//!
//! and runs the requested operation between every `pre` and `post`
//! operation. `${key}` is substituted from `#key(value)` entries in
//! `.enderpearl.conf`.
//!
//! ## Modules
//!
//! - [`script`] - config reader, tokenizer and executor
//! - [`executor`] - host shell [`ShellRunner`] implementation
//! - [`settings`] - XDG-compliant layered settings
//! - [`cli`] - command-line definitions

pub mod cli;
pub mod error;
pub mod executor;
pub mod script;
pub mod settings;

pub use cli::{Cli, Commands};
pub use error::{ErrorInfo, ScriptError};
pub use executor::{exec_command, exec_shell_command, ExecOptions, ExecResult, HostShell};
pub use script::{
    execute, parse_config, tokenize, CommandStatus, ConfigEntries, ConfigEntry, ExecutionReport,
    FailFast, Operation, Script, ScriptSource, ShellRunner, Tokenizer,
};
pub use settings::{load_settings, Settings};
