//! Per-entry outcomes and run totals.

use std::fmt;

/// What happened to one visited entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Excluded by the filter.
    Skipped,
    /// A directory that is being descended into.
    Directory,
    /// Hardlinked to the previous snapshot's copy.
    Linked { size: u64 },
    /// Copied from the source.
    Copied { size: u64 },
    /// Processing failed; the message says why.
    Errored { message: String },
}

impl Outcome {
    /// Create an errored outcome from any displayable error.
    pub fn errored(error: impl fmt::Display) -> Self {
        Self::Errored {
            message: error.to_string(),
        }
    }

    /// Check if this outcome is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }

    /// The tag written at the start of a log line.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Skipped => "Skip",
            Self::Directory => "Dir.",
            Self::Linked { .. } => "Link",
            Self::Copied { .. } => "Copy",
            Self::Errored { .. } => "Err.",
        }
    }
}

/// Totals accumulated over one backup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Directories descended into, including the root.
    pub dirs: u64,
    /// Files hardlinked to the previous snapshot.
    pub linked: u64,
    /// Files copied from the source.
    pub copied: u64,
    /// Entries excluded by the filter.
    pub skipped: u64,
    /// Entries that failed.
    pub errors: u64,
    /// Bytes shared with the previous snapshot.
    pub bytes_linked: u64,
    /// Bytes written to the new snapshot.
    pub bytes_copied: u64,
}

impl RunSummary {
    /// Create new empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Directory => self.dirs += 1,
            Outcome::Linked { size } => {
                self.linked += 1;
                self.bytes_linked += size;
            }
            Outcome::Copied { size } => {
                self.copied += 1;
                self.bytes_copied += size;
            }
            Outcome::Errored { .. } => self.errors += 1,
        }
    }

    /// Number of files placed in the snapshot.
    pub fn files(&self) -> u64 {
        self.linked + self.copied
    }

    /// Check if every entry was processed without error.
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}
