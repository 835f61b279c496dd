//! Common test utilities for enderpearl tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use enderpearl::{CommandStatus, ScriptError, ShellRunner};
use tempfile::TempDir;

/// Creates a temporary project with a `.enderpearl` script
pub fn create_script_project(script: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join(".enderpearl"), script).expect("Failed to write script");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a temporary project with a script and a `.enderpearl.conf`
pub fn create_configured_project(script: &str, config: &str) -> (TempDir, PathBuf) {
    let (dir, path) = create_script_project(script);
    std::fs::write(path.join(".enderpearl.conf"), config).expect("Failed to write config");
    (dir, path)
}

/// Creates a temporary directory with no script
pub fn create_empty_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Runner that records invocations instead of spawning processes
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub calls: Vec<(String, PathBuf)>,
    /// Commands that should report exit code 1
    pub failing: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn commands(&self) -> Vec<&str> {
        self.calls.iter().map(|(c, _)| c.as_str()).collect()
    }
}

impl ShellRunner for RecordingRunner {
    fn run(&mut self, command: &str, root: &Path) -> Result<CommandStatus, ScriptError> {
        self.calls.push((command.to_string(), root.to_path_buf()));
        let code = if self.failing.iter().any(|f| f == command) {
            1
        } else {
            0
        };
        Ok(CommandStatus::from_code(Some(code)))
    }
}

/// Sample script exercising hooks, config references and duplicates
pub const SAMPLE_SCRIPT: &str = r#"
Project tasks. Text outside operations is ignored.

#pre(
    echo "preparing ${name}"
)

#build(
    cargo build --target ${target}
    echo built
)

#test(cargo test)

#post(echo "finished ${NAME}")
"#;

/// Sample config for [`SAMPLE_SCRIPT`]
pub const SAMPLE_CONFIG: &str = r#"
#name(pearl)
#target(x86_64-unknown-linux-gnu)
"#;
