//! Script interpreter core
//!
//! - [`config`] - `#key(value)` configuration reader
//! - [`tokenizer`] - `#name(body)` script tokenizer with `${key}` substitution
//! - [`executor`] - pre / requested / post execution through a [`ShellRunner`]
//! - [`source`] - script and config files under a project root

pub mod config;
pub mod executor;
pub mod model;
pub mod source;
pub mod tokenizer;

pub use config::parse_config;
pub use executor::{
    execute, is_reserved, CommandStatus, ExecutionReport, FailFast, ShellRunner,
};
pub use model::{
    Command, ConfigEntries, ConfigEntry, Operation, Script, POST_OPERATION, PRE_OPERATION,
};
pub use source::{ScriptSource, CONFIG_FILE, SCRIPT_FILE};
pub use tokenizer::{tokenize, Tokenizer, DEFAULT_PREFIX};
