//! Script and config files under a project root

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::config::parse_config;
use super::model::{ConfigEntries, Script};
use super::tokenizer::Tokenizer;
use crate::error::ScriptError;

/// Default script file name
pub const SCRIPT_FILE: &str = ".enderpearl";

/// Default config file name
pub const CONFIG_FILE: &str = ".enderpearl.conf";

/// Read a file, treating "not found" as `None`
fn read_optional(path: &Path) -> Result<Option<String>, ScriptError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(ScriptError::Io(e)),
    }
}

/// Locations of the script and config files for one project
#[derive(Debug, Clone)]
pub struct ScriptSource {
    root: PathBuf,
    script_file: String,
    config_file: String,
    tokenizer: Tokenizer,
}

impl ScriptSource {
    /// Source using the default file names under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            script_file: SCRIPT_FILE.to_string(),
            config_file: CONFIG_FILE.to_string(),
            tokenizer: Tokenizer::new(),
        }
    }

    pub fn with_script_file(mut self, name: impl Into<String>) -> Self {
        self.script_file = name.into();
        self
    }

    pub fn with_config_file(mut self, name: impl Into<String>) -> Self {
        self.config_file = name.into();
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join(&self.script_file)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }

    /// Read the config file; a missing file gives no entries
    pub fn load_config(&self) -> Result<ConfigEntries, ScriptError> {
        Ok(read_optional(&self.config_path())?
            .map(|text| parse_config(&text))
            .unwrap_or_default())
    }

    /// Read and tokenize the script against `config`
    ///
    /// # Returns
    /// * `Ok(None)` - the script file does not exist, so there is nothing
    ///   to run
    pub fn load_script(&self, config: &ConfigEntries) -> Result<Option<Script>, ScriptError> {
        let Some(text) = read_optional(&self.script_path())? else {
            return Ok(None);
        };
        let script = self.tokenizer.tokenize(&text, config);
        tracing::debug!(
            "Loaded {} operation(s) from {}",
            script.len(),
            self.script_path().display()
        );
        Ok(Some(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files() {
        let dir = TempDir::new().unwrap();
        let source = ScriptSource::new(dir.path());

        let config = source.load_config().unwrap();
        assert!(config.is_empty());
        assert!(source.load_script(&config).unwrap().is_none());
    }

    #[test]
    fn test_load_script_with_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "#target(wasm32-unknown-unknown)\n").unwrap();
        fs::write(
            dir.path().join(SCRIPT_FILE),
            "#build(\ncargo build --target ${target}\n)\n",
        )
        .unwrap();

        let source = ScriptSource::new(dir.path());
        let config = source.load_config().unwrap();
        let script = source.load_script(&config).unwrap().unwrap();

        assert_eq!(script.len(), 1);
        assert_eq!(
            script.operations()[0].commands()[0].text(),
            "cargo build --target wasm32-unknown-unknown"
        );
    }

    #[test]
    fn test_custom_file_names_and_prefix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tasks.ep"), "@test(cargo test)").unwrap();

        let source = ScriptSource::new(dir.path())
            .with_script_file("tasks.ep")
            .with_config_file("tasks.conf")
            .with_tokenizer(Tokenizer::new().with_prefix('@'));

        let script = source.load_script(&ConfigEntries::new()).unwrap().unwrap();
        assert_eq!(script.names(), vec!["test"]);
        assert!(source.config_path().ends_with("tasks.conf"));
    }

    #[test]
    fn test_unreadable_script_is_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be
        fs::create_dir(dir.path().join(SCRIPT_FILE)).unwrap();

        let source = ScriptSource::new(dir.path());
        let result = source.load_script(&ConfigEntries::new());
        assert!(matches!(result, Err(ScriptError::Io(_))));
    }
}
