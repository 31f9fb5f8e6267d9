//! Tab-separated report of every visited entry.
//!
//! Log stream lines, fields separated by a tab:
//!
//! ```text
//! Link <size> <path>
//! Copy <size> <path>
//! Skip <>     <path>   verbose only
//! Dir. <>     <path>   verbose only
//! Err. <>     <path>   verbose only
//! ```
//!
//! Errors always go to the error stream as `<path>` tab `<message>`.

use std::io::{self, Write};
use std::path::Path;

use rosids_core::{BackupConfig, BackupError, Encoding, Outcome, Stream};

/// Settings for a [`Logger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Report directories, skips and errors on the log stream too.
    pub verbose: bool,
    /// Encoding of paths on the log stream.
    pub log_encoding: Encoding,
    /// Encoding of paths on the error stream.
    pub error_encoding: Encoding,
}

impl From<&BackupConfig> for LogOptions {
    fn from(config: &BackupConfig) -> Self {
        Self {
            verbose: config.verbose,
            log_encoding: config.log_encoding,
            error_encoding: config.error_encoding,
        }
    }
}

/// Writes one record per outcome to a log stream and an error stream.
///
/// Both writers are flushed by [`Logger::flush`] and again when the logger
/// is dropped.
pub struct Logger<W: Write, E: Write> {
    out: W,
    err: E,
    options: LogOptions,
}

impl<W: Write, E: Write> Logger<W, E> {
    /// Create a logger over the given streams.
    pub fn new(out: W, err: E, options: LogOptions) -> Self {
        Self { out, err, options }
    }

    /// Record the outcome for `path`.
    pub fn record(&mut self, path: &Path, outcome: &Outcome) -> Result<(), BackupError> {
        match outcome {
            Outcome::Linked { size } | Outcome::Copied { size } => {
                let size = size.to_string();
                self.write_log(outcome.tag(), &size, path)
            }
            Outcome::Skipped | Outcome::Directory => {
                if self.options.verbose {
                    self.write_log(outcome.tag(), "", path)?;
                }
                Ok(())
            }
            Outcome::Errored { message } => {
                self.write_error(path, message)?;
                if self.options.verbose {
                    self.write_log(outcome.tag(), "", path)?;
                }
                Ok(())
            }
        }
    }

    /// Flush both streams.
    pub fn flush(&mut self) -> Result<(), BackupError> {
        self.out.flush().map_err(log_error(Stream::Log))?;
        self.err.flush().map_err(log_error(Stream::Error))
    }

    fn write_log(&mut self, tag: &str, size: &str, path: &Path) -> Result<(), BackupError> {
        write_log_line(&mut self.out, tag, size, path, self.options.log_encoding)
            .map_err(log_error(Stream::Log))
    }

    fn write_error(&mut self, path: &Path, message: &str) -> Result<(), BackupError> {
        write_error_line(&mut self.err, path, message, self.options.error_encoding)
            .map_err(log_error(Stream::Error))
    }
}

impl<W: Write, E: Write> Drop for Logger<W, E> {
    fn drop(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

fn log_error(stream: Stream) -> impl FnOnce(io::Error) -> BackupError {
    move |source| BackupError::Log { stream, source }
}

fn write_log_line(
    out: &mut impl Write,
    tag: &str,
    size: &str,
    path: &Path,
    encoding: Encoding,
) -> io::Result<()> {
    write!(out, "{tag}\t{size}\t")?;
    write_path(out, path, encoding)?;
    out.write_all(b"\n")
}

fn write_error_line(
    out: &mut impl Write,
    path: &Path,
    message: &str,
    encoding: Encoding,
) -> io::Result<()> {
    write_path(out, path, encoding)?;
    writeln!(out, "\t{message}")
}

/// Write a path in the requested encoding.
fn write_path(out: &mut impl Write, path: &Path, encoding: Encoding) -> io::Result<()> {
    let bytes = path.as_os_str().as_encoded_bytes();
    match encoding {
        Encoding::Native => out.write_all(bytes),
        Encoding::Utf8 => {
            for chunk in bytes.utf8_chunks() {
                out.write_all(chunk.valid().as_bytes())?;
                for byte in chunk.invalid() {
                    write!(out, "\\x{byte:02X}")?;
                }
            }
            Ok(())
        }
    }
}
