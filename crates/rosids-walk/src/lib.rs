//! Snapshot traversal engine for rosids.
//!
//! # Overview
//!
//! `rosids-walk` walks a source tree next to the previous snapshot of it and
//! builds a new snapshot:
//!
//! - **Unchanged files** (same size and mtime) are hardlinked to the previous copy
//! - **Changed or new files** are copied
//! - **Exclusions** by destination, attributes, junctions and path patterns
//! - **Report** of every decision on a log stream and an error stream
//!
//! # Example
//!
//! ```rust,no_run
//! use rosids_core::BackupConfig;
//! use rosids_walk::Walker;
//!
//! let config = BackupConfig::builder()
//!     .source("/data")
//!     .link_source("/backup/monday")
//!     .destination("/backup/tuesday")
//!     .build()
//!     .unwrap();
//!
//! let mut walker = Walker::from_config(&config, std::io::stdout(), std::io::stderr()).unwrap();
//! let summary = walker
//!     .run(&config.source, &config.link_source, &config.destination)
//!     .unwrap();
//!
//! println!("{} files, {} errors", summary.files(), summary.errors);
//! ```

mod comparator;
mod filter;
mod logger;
mod walker;

pub use comparator::Comparator;
pub use filter::{CASE_SENSITIVE_MARKER, Filter};
pub use logger::{LogOptions, Logger};
pub use walker::Walker;

// Re-export core types for convenience
pub use rosids_core::{BackupConfig, BackupError, ConfigError, Outcome, RunSummary};
