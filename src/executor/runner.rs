//! Host shell execution with timeout support
//!
//! Provides the production [`ShellRunner`]:
//! - Commands run through the host shell (`sh -c` / `cmd /C`)
//! - Working directory set per command, never process-wide
//! - Optional timeout, output capture and truncation
//! - Environment variable injection

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio::time::timeout;

use crate::error::ScriptError;
use crate::script::{CommandStatus, ShellRunner};

/// Maximum captured output size before truncation (in bytes)
pub const MAX_OUTPUT_SIZE: usize = 100_000; // 100KB

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// Default shell program and the flag that passes it a command string
#[cfg(windows)]
pub const DEFAULT_SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
pub const DEFAULT_SHELL: (&str, &str) = ("sh", "-c");

/// Options for async command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout duration (None = no timeout)
    pub timeout: Option<Duration>,
    /// Capture output instead of passing the terminal through
    pub capture_output: bool,
    /// Maximum output size before truncation
    pub max_output_size: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            capture_output: true,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl ExecOptions {
    /// Set the working directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set maximum output size
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }

    /// Inherit stdout/stderr instead of capturing
    pub fn inherit_output(mut self) -> Self {
        self.capture_output = false;
        self
    }
}

/// Result of async command execution
#[derive(Debug)]
pub struct ExecResult {
    /// Exit code if available
    pub exit_code: Option<i32>,
    /// Captured standard output (empty when inherited)
    pub stdout: String,
    /// Whether stdout was truncated
    pub stdout_truncated: bool,
    /// Captured standard error (empty when inherited)
    pub stderr: String,
    /// Whether stderr was truncated
    pub stderr_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

impl ExecResult {
    pub fn status(&self) -> CommandStatus {
        CommandStatus::from_code(self.exit_code)
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Execute a program asynchronously with timeout support
///
/// # Errors
/// * `ScriptError::SpawnFailed` - If the command couldn't be spawned
/// * `ScriptError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_command(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecResult, ScriptError> {
    let start = Instant::now();
    let command_str = format!("{} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);
    if options.capture_output {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    }
    cmd.kill_on_drop(true); // Kill process if future is dropped

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    tracing::trace!("Spawning: {}", command_str);

    let child = cmd.spawn().map_err(|e| ScriptError::SpawnFailed {
        command: command_str.clone(),
        error: e.to_string(),
    })?;

    let result = if let Some(timeout_duration) = options.timeout {
        match timeout(timeout_duration, wait_for_output(child, options.max_output_size)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScriptError::Timeout {
                    command: command_str,
                    timeout_secs: timeout_duration.as_secs(),
                });
            }
        }
    } else {
        wait_for_output(child, options.max_output_size).await?
    };

    Ok(ExecResult {
        exit_code: result.exit_code,
        stdout: result.stdout,
        stdout_truncated: result.stdout_truncated,
        stderr: result.stderr,
        stderr_truncated: result.stderr_truncated,
        duration: start.elapsed(),
    })
}

/// Run a command string through a shell
///
/// # Arguments
/// * `shell` - Shell program (e.g., "sh", "bash", "cmd")
/// * `flag` - Flag that makes the shell read a command string ("-c", "/C")
/// * `command` - Command string to execute
/// * `options` - Execution options
pub async fn exec_shell_command(
    shell: &str,
    flag: &str,
    command: &str,
    options: &ExecOptions,
) -> Result<ExecResult, ScriptError> {
    exec_command(shell, &[flag, command], options).await
}

/// Internal result from waiting for process output
struct WaitResult {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

/// Wait for a child process and capture whatever output was piped
async fn wait_for_output(
    mut child: tokio::process::Child,
    max_output_size: usize,
) -> Result<WaitResult, ScriptError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Read stdout and stderr concurrently
    let stdout_handle = tokio::spawn(async move {
        match stdout {
            Some(stdout) => read_and_truncate(stdout, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let stderr_handle = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_and_truncate(stderr, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let status = child.wait().await?;

    let (stdout, stdout_truncated) = stdout_handle
        .await
        .map_err(|e| ScriptError::Io(std::io::Error::other(format!("stdout task failed: {}", e))))?;

    let (stderr, stderr_truncated) = stderr_handle
        .await
        .map_err(|e| ScriptError::Io(std::io::Error::other(format!("stderr task failed: {}", e))))?;

    Ok(WaitResult {
        exit_code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

/// Read from an async reader and truncate if too large
async fn read_and_truncate<R: tokio::io::AsyncRead + Unpin>(
    reader: R,
    max_size: usize,
) -> (String, bool) {
    let mut buf_reader = BufReader::new(reader);
    let mut output = String::with_capacity(max_size.min(64 * 1024));
    let mut line = String::with_capacity(4096);
    let mut truncated = false;

    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                if output.len() + line.len() > max_size {
                    let remaining = max_size.saturating_sub(output.len());
                    // Cut on a char boundary
                    let mut cut = remaining.min(line.len());
                    while !line.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    output.push_str(&line[..cut]);
                    output.push_str(TRUNCATION_MARKER);
                    truncated = true;
                    break;
                }
                output.push_str(&line);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }

    (output, truncated)
}

/// Output of one captured command, kept by [`HostShell`] in capture mode
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// [`ShellRunner`] backed by the host shell
///
/// Owns a current-thread runtime and blocks on each command, so commands run
/// strictly one after another. Must not be used from inside another tokio
/// runtime.
pub struct HostShell {
    program: PathBuf,
    flag: String,
    options: ExecOptions,
    outputs: Vec<CommandOutput>,
    runtime: Runtime,
}

impl std::fmt::Debug for HostShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostShell")
            .field("program", &self.program)
            .field("flag", &self.flag)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl HostShell {
    /// Create a runner for the platform default shell
    pub fn new() -> Result<Self, ScriptError> {
        Self::with_shell(DEFAULT_SHELL.0, DEFAULT_SHELL.1)
    }

    /// Create a runner for `program`, passing commands after `flag`
    ///
    /// # Errors
    /// * `ScriptError::SpawnFailed` - `program` cannot be found on PATH
    pub fn with_shell(program: &str, flag: &str) -> Result<Self, ScriptError> {
        let resolved = which::which(program).map_err(|e| ScriptError::SpawnFailed {
            command: program.to_string(),
            error: e.to_string(),
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ScriptError::Io(std::io::Error::other(format!(
                    "Failed to create runtime: {}",
                    e
                )))
            })?;

        tracing::debug!("Using shell {} {}", resolved.display(), flag);

        Ok(Self {
            program: resolved,
            flag: flag.to_string(),
            options: ExecOptions::default().inherit_output(),
            outputs: Vec::new(),
            runtime,
        })
    }

    /// Kill commands that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set an environment variable for every command
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Truncate captured stdout/stderr beyond `size` bytes
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.options = self.options.with_max_output(size);
        self
    }

    /// Capture output into [`HostShell::outputs`] instead of the terminal
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.options.capture_output = capture;
        self
    }

    /// Outputs of the commands run so far (capture mode only)
    pub fn outputs(&self) -> &[CommandOutput] {
        &self.outputs
    }

    pub fn take_outputs(&mut self) -> Vec<CommandOutput> {
        std::mem::take(&mut self.outputs)
    }
}

impl ShellRunner for HostShell {
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError> {
        let options = self.options.clone().in_dir(root);
        let program = self.program.to_string_lossy();

        let result = self
            .runtime
            .block_on(exec_shell_command(&program, &self.flag, command, &options))
            .map_err(|e| match e {
                // Report the script line rather than the shell invocation
                ScriptError::Timeout { timeout_secs, .. } => ScriptError::Timeout {
                    command: command.to_string(),
                    timeout_secs,
                },
                other => other,
            })?;

        if self.options.capture_output {
            self.outputs.push(CommandOutput {
                command: command.to_string(),
                exit_code: result.exit_code,
                stdout: result.stdout.clone(),
                stderr: result.stderr.clone(),
                duration_ms: result.duration.as_millis() as u64,
            });
        }

        Ok(result.status())
    }
}
