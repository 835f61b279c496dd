//! Settings loader with XDG-compliant path resolution
//!
//! Loads settings from multiple locations with layered priority:
//! 1. `/etc/enderpearl/config.toml` (lowest priority)
//! 2. `~/.config/enderpearl/config.toml`
//! 3. `~/.enderpearl.toml`
//! 4. `./.enderpearl.toml`
//! 5. An explicit override file
//! 6. `ENDERPEARL_` environment variables (highest priority)

use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::{expand_path, Settings};

/// Application name used for XDG directories
const APP_NAME: &str = "enderpearl";

/// Get settings search paths in priority order (lowest to highest)
pub fn settings_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/{}/config.toml", APP_NAME)));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", APP_NAME)));
    }

    paths.push(PathBuf::from(format!(".{}.toml", APP_NAME)));

    paths
}

/// Load settings with XDG layering
///
/// # Arguments
/// * `override_path` - Optional settings file that takes priority over the
///   search paths (`~` and `$VAR` are expanded)
pub fn load_settings(override_path: Option<&str>) -> Result<Settings> {
    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

    for path in settings_paths() {
        if path.exists() {
            tracing::debug!("Loading settings from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        }
    }

    if let Some(raw) = override_path {
        let path = expand_path(raw)?;
        if path.exists() {
            tracing::debug!("Loading override settings from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        } else {
            tracing::warn!("Override settings not found: {}", path.display());
        }
    }

    // Format: ENDERPEARL_SHELL__TIMEOUT=600 maps to shell.timeout = 600
    figment = figment.merge(Env::prefixed("ENDERPEARL_").split("__"));

    figment.extract().context("Failed to load settings")
}

/// Find all existing settings files
pub fn find_settings_files() -> Vec<PathBuf> {
    settings_paths().into_iter().filter(|p| p.exists()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_paths_order() {
        let paths = settings_paths();

        assert!(paths.len() >= 2);
        assert!(paths[0].to_string_lossy().contains("/etc/"));
        assert!(paths
            .last()
            .unwrap()
            .to_string_lossy()
            .contains(".enderpearl.toml"));
    }

    #[test]
    fn test_load_settings_from_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        fs::write(
            &path,
            r#"
            [script]
            file = "tasks.ep"

            [shell]
            timeout = 45
            "#,
        )
        .unwrap();

        let settings = load_settings(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(settings.script.file, "tasks.ep");
        assert_eq!(settings.shell.timeout, 45);
    }

    #[test]
    fn test_missing_override_uses_defaults() {
        let settings = load_settings(Some("/nonexistent/enderpearl.toml")).unwrap();
        assert_eq!(settings.script.config_file, ".enderpearl.conf");
    }

    #[test]
    fn test_invalid_override_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[shell]\ntimeout = \"soon\"\n").unwrap();

        assert!(load_settings(Some(path.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("ENDERPEARL_SCRIPT__DEFAULT_OPERATION", "all");

        let settings = load_settings(None).unwrap();

        std::env::remove_var("ENDERPEARL_SCRIPT__DEFAULT_OPERATION");

        assert_eq!(settings.script.default_operation, "all");
    }

    #[test]
    fn test_find_settings_files_does_not_panic() {
        let _files = find_settings_files();
    }
}
