//! Core types for rosids.
//!
//! This crate provides the types shared by the rest of the workspace:
//! attribute masks, run configuration, per-entry outcomes and errors.

mod attr;
mod config;
mod error;
mod outcome;
pub mod path;

pub use attr::{ADDABLE_FILE_ATTRIBUTES, Attribute, AttributeMask, EXCLUDABLE_FILE_ATTRIBUTES};
pub use config::{BackupConfig, BackupConfigBuilder, BackupConfigBuilderError, Encoding};
pub use error::{BackupError, ConfigError, OpError, Operation, Stream};
pub use outcome::{Outcome, RunSummary};
