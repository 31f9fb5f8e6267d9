//! Error types for backup runs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors in the run configuration, raised before any traversal starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An attribute string contains a letter that is unknown or not allowed.
    #[error("invalid attribute letter '{letter}', expected one or more of [{allowed}]")]
    InvalidAttribute { letter: char, allowed: String },

    /// An exclusion pattern is not a valid regular expression.
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// SOURCE or LINK_SOURCE is not an existing directory.
    #[error("{role} is not an existing directory: {path}")]
    NotADirectory { role: &'static str, path: PathBuf },

    /// DESTINATION exists and has entries in it.
    #[error("DESTINATION is not an empty directory: {path}")]
    DestinationNotEmpty { path: PathBuf },

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    /// A required setting is missing or malformed.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// I/O error while checking the configuration.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The filesystem operation an [`OpError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Operation {
    #[strum(to_string = "create directory")]
    CreateDirectory,
    #[strum(to_string = "copy")]
    Copy,
    #[strum(to_string = "hardlink")]
    Link,
    #[strum(to_string = "read metadata")]
    ReadMetadata,
    #[strum(to_string = "read attributes")]
    GetAttributes,
    #[strum(to_string = "set attributes")]
    SetAttributes,
    #[strum(to_string = "read directory")]
    ReadDirectory,
}

/// A failed operation on a single entry.
///
/// These are recovered by the walker: the entry is reported as errored and
/// traversal carries on with its siblings.
#[derive(Debug, Error)]
#[error("{op} {}: {source}", path.display())]
pub struct OpError {
    /// What was being attempted.
    pub op: Operation,
    /// The path the operation failed on.
    pub path: PathBuf,
    /// The underlying OS error.
    #[source]
    pub source: std::io::Error,
}

impl OpError {
    /// Create an operation error with path context.
    pub fn new(op: Operation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }

    /// Closure adapter for `map_err`.
    pub fn with(op: Operation, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::new(op, path, source)
    }
}

/// Errors that abort a whole backup run.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The source root itself matched an exclusion rule.
    #[error("source {path} is excluded, nothing to back up")]
    SourceExcluded { path: PathBuf },

    /// The destination root could not be created.
    #[error("failed to create destination {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source root could not be listed.
    #[error("failed to read source {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log or error stream could not be written.
    #[error("failed to write {stream} stream: {source}")]
    Log {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },
}

/// Which output stream of the event sink failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stream {
    #[strum(to_string = "log")]
    Log,
    #[strum(to_string = "error")]
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_error_message() {
        let err = OpError::new(
            Operation::Copy,
            "/dst/a.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.starts_with("copy "));
        assert!(message.contains("a.txt"));
        assert!(message.ends_with("denied"));
    }

    #[test]
    fn test_op_error_with_adapter() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.map_err(OpError::with(Operation::Link, "/x")).unwrap_err();
        assert_eq!(err.op, Operation::Link);
        assert_eq!(err.path, PathBuf::from("/x"));
    }

    #[test]
    fn test_backup_error_names_stream() {
        let err = BackupError::Log {
            stream: Stream::Error,
            source: std::io::Error::other("closed"),
        };
        assert!(err.to_string().contains("error stream"));
        assert_eq!(Stream::Log.to_string(), "log");
    }
}
