//! Configuration for the `funcity` CLI (§2 "Configuration").
//!
//! A small TOML file (default `funcity.toml`) controlling the default
//! parse mode and output form, loaded the way `faxt`'s `config.rs` loads
//! its own settings: current directory, then home, then system config
//! directory, defaulting to `Config::default()` if none is found.

use dirs::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

pub const CONFIG_FILE_NAME: &str = "funcity.toml";

/// Which parse mode a source file is run through when `--mode` isn't
/// given on the command line (§4.1/§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    Template,
    Code,
}

/// Which shape the run's output takes when `--sequence` isn't given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputSetting {
    Text,
    Sequence,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "default_mode")]
    pub mode: ModeSetting,

    #[serde(default = "default_output")]
    pub output: OutputSetting,
}

fn default_mode() -> ModeSetting {
    ModeSetting::Template
}

fn default_output() -> OutputSetting {
    OutputSetting::Text
}

impl Default for Config {
    fn default() -> Self {
        Self { verbose: false, mode: default_mode(), output: default_output() }
    }
}

impl Config {
    /// Loads from the default search path, falling back to `Config::default()`.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!("configuration file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Config(format!("failed to parse configuration: {e}")))
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir().map(|dir| dir.join(".config").join("funcity").join(CONFIG_FILE_NAME)).filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("funcity").join(CONFIG_FILE_NAME)).filter(|path| path.exists())
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config().or_else(Self::check_home_config).or_else(Self::check_system_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_template_and_text() {
        let config = Config::default();
        assert_eq!(config.mode, ModeSetting::Template);
        assert_eq!(config.output, OutputSetting::Text);
        assert!(!config.verbose);
    }

    #[test]
    fn loads_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("funcity.toml");
        std::fs::write(&path, "mode = \"code\"\noutput = \"sequence\"\nverbose = true\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.mode, ModeSetting::Code);
        assert_eq!(config.output, OutputSetting::Sequence);
        assert!(config.verbose);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = Config::load_from_path(Path::new("/nonexistent/funcity.toml"));
        assert!(result.is_err());
    }
}
