//! Defaults read from a TOML configuration file.

use std::path::{Path, PathBuf};

use rosids_core::ConfigError;
use serde::Deserialize;

/// Settings that can be stored in `config.toml`.
///
/// Every key is optional and mirrors the command-line option of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub list_only: bool,
    pub add_file_attr: Option<String>,
    pub exclude_file_by_attr: Option<String>,
    pub exclude_by_regexp: Vec<String>,
    pub exclude_junctions: bool,
    pub exclude_dir_junctions: bool,
    pub exclude_file_junctions: bool,
    pub verbose: bool,
    pub utf8_log: bool,
    pub utf8_error: bool,
}

impl FileSettings {
    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rosids").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default path if that file
    /// exists. No file at all means empty settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|message| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}
