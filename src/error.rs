//! Error types for enderpearl
//!
//! Provides structured error types with suggestions for common issues.

use serde::Serialize;
use thiserror::Error;

/// Message shown when `pre` or `post` is requested directly
pub const RESERVED_OPERATION_MESSAGE: &str = "Sorry, you may not use this special operation";

/// Main error type for script operations
#[derive(Error, Debug)]
pub enum ScriptError {
    /// `pre`/`post` requested as the target operation
    #[error("Sorry, you may not use this special operation: '{name}'")]
    ReservedOperation { name: String },

    /// Command exited non-zero under the fail-fast policy
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        suggestion: Option<String>,
    },

    /// Failed to spawn the shell
    #[error("Failed to spawn command: {command}")]
    SpawnFailed { command: String, error: String },

    /// Command timed out
    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Whether this is the reserved-name rejection
    pub fn is_reserved(&self) -> bool {
        matches!(self, ScriptError::ReservedOperation { .. })
    }
}

/// Serializable error info for JSON output
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&ScriptError> for ErrorInfo {
    fn from(err: &ScriptError) -> Self {
        match err {
            ScriptError::ReservedOperation { name } => ErrorInfo {
                message: format!("{}: '{}'", RESERVED_OPERATION_MESSAGE, name),
                error_type: "reserved_operation".to_string(),
                suggestion: Some(
                    "'pre' and 'post' run automatically around every operation".to_string(),
                ),
                exit_code: None,
            },
            ScriptError::CommandFailed {
                command,
                exit_code,
                suggestion,
            } => ErrorInfo {
                message: format!("Command failed: {}", command),
                error_type: "command_failed".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
            },
            ScriptError::SpawnFailed { command, error } => ErrorInfo {
                message: format!("Failed to spawn command: {}", command),
                error_type: "spawn_failed".to_string(),
                suggestion: Some(format!("Check that the shell exists: {}", error)),
                exit_code: None,
            },
            ScriptError::Timeout {
                command,
                timeout_secs,
            } => ErrorInfo {
                message: format!("Command timed out after {}s: {}", timeout_secs, command),
                error_type: "timeout".to_string(),
                suggestion: Some(
                    "Try increasing the timeout or checking if the command hangs".to_string(),
                ),
                exit_code: None,
            },
            ScriptError::Settings(msg) => ErrorInfo {
                message: format!("Settings error: {}", msg),
                error_type: "settings_error".to_string(),
                suggestion: Some("Check your enderpearl settings file".to_string()),
                exit_code: None,
            },
            ScriptError::Io(e) => ErrorInfo {
                message: format!("IO error: {}", e),
                error_type: "io_error".to_string(),
                suggestion: None,
                exit_code: None,
            },
        }
    }
}

/// Suggest fixes for common failures of a script command
///
/// Exit codes follow the POSIX shell conventions: 126 is "found but not
/// executable", 127 is "command not found".
pub fn suggest_fix(command: &str, exit_code: Option<i32>) -> Option<String> {
    let program = command.split_whitespace().next().unwrap_or(command);

    match exit_code {
        Some(127) => Some(format!(
            "'{}' command not found. Check PATH and dependencies.",
            program
        )),
        Some(126) => Some(format!(
            "'{}' is not executable. Check file permissions.",
            program
        )),
        Some(code) if code > 128 => Some(format!(
            "'{}' was terminated by signal {}.",
            program,
            code - 128
        )),
        None => Some(format!("'{}' was terminated by a signal.", program)),
        _ => None,
    }
}
