//! Operation executor
//!
//! Runs a parsed [`Script`] for one requested operation name in three passes
//! over the operations, in source order:
//!
//! 1. every operation named `pre`
//! 2. every operation named like the request
//! 3. every operation named `post`
//!
//! Commands are handed to a [`ShellRunner`] one at a time. A non-zero exit
//! status does not stop the run; wrap the runner in [`FailFast`] for that.

use std::path::Path;

use serde::Serialize;

use super::model::{names_match, Operation, Script, POST_OPERATION, PRE_OPERATION};
use crate::error::{suggest_fix, ScriptError};

/// Exit status of one shell command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandStatus {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn from_code(code: Option<i32>) -> Self {
        Self { code }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Runs one command line through the host shell
#[cfg_attr(test, mockall::automock)]
pub trait ShellRunner {
    /// Run `command` with `root` as the working directory
    ///
    /// # Errors
    /// * Any error stops the remaining passes and is returned from
    ///   [`execute`]
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError>;
}

impl<R: ShellRunner + ?Sized> ShellRunner for &mut R {
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError> {
        (**self).run(command, root)
    }
}

impl<R: ShellRunner + ?Sized> ShellRunner for Box<R> {
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError> {
        (**self).run(command, root)
    }
}

/// Runner wrapper that turns a non-zero exit status into an error
#[derive(Debug)]
pub struct FailFast<R> {
    inner: R,
}

impl<R: ShellRunner> FailFast<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ShellRunner> ShellRunner for FailFast<R> {
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError> {
        let status = self.inner.run(command, root)?;
        if status.success() {
            Ok(status)
        } else {
            Err(ScriptError::CommandFailed {
                command: command.to_string(),
                exit_code: status.code,
                suggestion: suggest_fix(command, status.code),
            })
        }
    }
}

/// Summary of one execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Names of the operations run, in order
    pub operations: Vec<String>,
    /// Number of commands handed to the runner
    pub commands_run: usize,
    /// Commands that exited non-zero, with their status
    pub failures: Vec<(String, CommandStatus)>,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Whether `name` is `pre` or `post`
pub fn is_reserved(name: &str) -> bool {
    names_match(name, PRE_OPERATION) || names_match(name, POST_OPERATION)
}

/// Execute `requested` from `script`, bracketed by `pre` and `post`
///
/// Requesting a name that matches no operation is not an error; only the
/// `pre`/`post` passes (if any) run.
///
/// # Errors
/// * `ScriptError::ReservedOperation` - `requested` is `pre` or `post`;
///   nothing is run
/// * Any error returned by `runner`
pub fn execute<R>(
    script: &Script,
    requested: &str,
    root: &Path,
    runner: &mut R,
) -> Result<ExecutionReport, ScriptError>
where
    R: ShellRunner + ?Sized,
{
    if is_reserved(requested) {
        return Err(ScriptError::ReservedOperation {
            name: requested.to_string(),
        });
    }

    let mut report = ExecutionReport::default();

    for pass in [PRE_OPERATION, requested, POST_OPERATION] {
        for operation in script.find(pass) {
            run_operation(operation, root, runner, &mut report)?;
        }
    }

    if report.operations.is_empty() {
        tracing::debug!("No operation named '{}'", requested);
    }

    Ok(report)
}

fn run_operation<R>(
    operation: &Operation,
    root: &Path,
    runner: &mut R,
    report: &mut ExecutionReport,
) -> Result<(), ScriptError>
where
    R: ShellRunner + ?Sized,
{
    tracing::info!("Running operation '{}'", operation.name());
    report.operations.push(operation.name().to_string());

    for command in operation.commands() {
        tracing::debug!("Executing: {}", command);
        let status = runner.run(command.text(), root)?;
        report.commands_run += 1;

        if !status.success() {
            tracing::warn!("Command exited with {:?}: {}", status.code, command);
            report.failures.push((command.text().to_string(), status));
        }
    }

    Ok(())
}
