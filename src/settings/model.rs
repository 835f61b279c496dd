//! Settings model for enderpearl
//!
//! Tool-level settings: where the script lives, how it is tokenized and how
//! commands are run. These are separate from the `#key(value)` entries that
//! scripts substitute with `${key}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ScriptError;
use crate::executor::{HostShell, DEFAULT_SHELL, MAX_OUTPUT_SIZE};
use crate::script::{ScriptSource, Tokenizer, CONFIG_FILE, DEFAULT_PREFIX, SCRIPT_FILE};

/// Root settings structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Script file locations and grammar
    #[serde(default)]
    pub script: ScriptSettings,

    /// Shell used to run commands
    #[serde(default)]
    pub shell: ShellSettings,
}

/// Script file settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptSettings {
    /// Script file name, relative to the project root
    #[serde(default = "default_script_file")]
    pub file: String,

    /// Config file name, relative to the project root
    #[serde(default = "default_config_file")]
    pub config_file: String,

    /// Character that starts an operation
    #[serde(default = "default_prefix")]
    pub prefix: char,

    /// Operation run when none is named
    #[serde(default = "default_operation")]
    pub default_operation: String,
}

fn default_script_file() -> String {
    SCRIPT_FILE.to_string()
}

fn default_config_file() -> String {
    CONFIG_FILE.to_string()
}

fn default_prefix() -> char {
    DEFAULT_PREFIX
}

fn default_operation() -> String {
    "build".to_string()
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            file: default_script_file(),
            config_file: default_config_file(),
            prefix: default_prefix(),
            default_operation: default_operation(),
        }
    }
}

/// Shell settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellSettings {
    /// Shell program
    #[serde(default = "default_shell_program")]
    pub program: String,

    /// Flag passing a command string to the shell
    #[serde(default = "default_shell_flag")]
    pub flag: String,

    /// Per-command timeout in seconds (0 = none)
    #[serde(default)]
    pub timeout: u64,

    /// Abort on the first command that exits non-zero
    #[serde(default)]
    pub fail_fast: bool,

    /// Capture command output instead of passing it through
    #[serde(default)]
    pub capture_output: bool,

    /// Captured bytes kept per stream before truncation
    #[serde(default = "default_max_output_size")]
    pub max_output_size: usize,

    /// Extra environment variables for every command
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_shell_program() -> String {
    DEFAULT_SHELL.0.to_string()
}

fn default_shell_flag() -> String {
    DEFAULT_SHELL.1.to_string()
}

fn default_max_output_size() -> usize {
    MAX_OUTPUT_SIZE
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
            flag: default_shell_flag(),
            timeout: 0,
            fail_fast: false,
            capture_output: false,
            max_output_size: default_max_output_size(),
            env: HashMap::new(),
        }
    }
}

impl ShellSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

/// Characters the script grammar already gives a meaning
const GRAMMAR_CHARS: [char; 5] = ['(', ')', '$', '{', '}'];

/// Expand `~` and `$VAR` in a path-like setting
pub fn expand_path(raw: &str) -> Result<PathBuf, ScriptError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ScriptError::Settings(format!("cannot expand '{}': {}", raw, e)))
}

impl Settings {
    /// Script source for a project root
    ///
    /// # Errors
    /// * `ScriptError::Settings` - the prefix is whitespace or one of the
    ///   grammar characters, or a file name cannot be expanded
    pub fn script_source(&self, root: &Path) -> Result<ScriptSource, ScriptError> {
        let prefix = self.script.prefix;
        if prefix.is_whitespace() || GRAMMAR_CHARS.contains(&prefix) {
            return Err(ScriptError::Settings(format!(
                "script.prefix '{}' cannot be whitespace or one of {:?}",
                prefix, GRAMMAR_CHARS
            )));
        }

        let script_file = expand_path(&self.script.file)?;
        let config_file = expand_path(&self.script.config_file)?;

        Ok(ScriptSource::new(root)
            .with_script_file(script_file.to_string_lossy())
            .with_config_file(config_file.to_string_lossy())
            .with_tokenizer(Tokenizer::new().with_prefix(prefix)))
    }

    /// Host shell configured from these settings
    pub fn host_shell(&self) -> Result<HostShell, ScriptError> {
        let mut shell = HostShell::with_shell(&self.shell.program, &self.shell.flag)?
            .capture_output(self.shell.capture_output)
            .with_max_output(self.shell.max_output_size);

        if let Some(timeout) = self.shell.timeout() {
            shell = shell.with_timeout(timeout);
        }
        for (key, value) in &self.shell.env {
            shell = shell.with_env(key, value);
        }

        Ok(shell)
    }
}
