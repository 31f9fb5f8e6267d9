//! Backup run configuration.

use std::fs;
use std::path::PathBuf;

use derive_builder::Builder;

use crate::attr::AttributeMask;
use crate::error::ConfigError;

/// How paths are written to an output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Raw OS bytes of the path.
    #[default]
    Native,
    /// Always valid UTF-8; bytes that are not are written as `\xNN`.
    Utf8,
}

/// Configuration for one backup run.
///
/// Built once before traversal and only read afterwards.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BackupConfig {
    /// Tree to back up.
    pub source: PathBuf,

    /// Previous snapshot that unchanged files are linked against.
    pub link_source: PathBuf,

    /// Where the new snapshot is written.
    pub destination: PathBuf,

    /// Only report what would be done.
    #[builder(default = "false")]
    pub list_only: bool,

    /// Attributes added to every copied file.
    #[builder(default)]
    pub add_file_attr: AttributeMask,

    /// Files having any of these attributes are excluded.
    #[builder(default)]
    pub exclude_file_by_attr: AttributeMask,

    /// Exclude directories that are junctions.
    #[builder(default = "false")]
    pub exclude_dir_junctions: bool,

    /// Exclude files that are junctions.
    #[builder(default = "false")]
    pub exclude_file_junctions: bool,

    /// Regular expressions matched against full paths.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Also report directories, skips and errors on the log stream.
    #[builder(default = "false")]
    pub verbose: bool,

    /// Encoding of the log stream.
    #[builder(default)]
    pub log_encoding: Encoding,

    /// Encoding of the error stream.
    #[builder(default)]
    pub error_encoding: Encoding,
}

impl BackupConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, path) in [
            ("Source", &self.source),
            ("Link source", &self.link_source),
            ("Destination", &self.destination),
        ] {
            match path {
                Some(path) if path.as_os_str().is_empty() => {
                    return Err(format!("{name} path cannot be empty"));
                }
                Some(_) => {}
                None => return Err(format!("{name} path is required")),
            }
        }
        Ok(())
    }
}

impl BackupConfig {
    /// Create a new config builder.
    pub fn builder() -> BackupConfigBuilder {
        BackupConfigBuilder::default()
    }

    /// Attribute bits that exclude a directory.
    pub fn dir_attr_to_exclude(&self) -> AttributeMask {
        if self.exclude_dir_junctions {
            AttributeMask::REPARSE_POINT
        } else {
            AttributeMask::EMPTY
        }
    }

    /// Attribute bits that exclude a file.
    pub fn file_attr_to_exclude(&self) -> AttributeMask {
        let mut mask = self.exclude_file_by_attr;
        if self.exclude_file_junctions {
            mask |= AttributeMask::REPARSE_POINT;
        }
        mask
    }

    /// Check the paths before anything is touched.
    ///
    /// SOURCE and LINK_SOURCE must be directories. DESTINATION must be
    /// missing or an empty directory.
    pub fn check_paths(&self) -> Result<(), ConfigError> {
        if !self.source.is_dir() {
            return Err(ConfigError::NotADirectory {
                role: "SOURCE",
                path: self.source.clone(),
            });
        }
        if !self.link_source.is_dir() {
            return Err(ConfigError::NotADirectory {
                role: "LINK_SOURCE",
                path: self.link_source.clone(),
            });
        }
        if self.destination.is_dir() {
            let mut entries = fs::read_dir(&self.destination).map_err(|source| ConfigError::Io {
                path: self.destination.clone(),
                source,
            })?;
            if entries.next().is_some() {
                return Err(ConfigError::DestinationNotEmpty {
                    path: self.destination.clone(),
                });
            }
        }
        Ok(())
    }
}
