//! Filesystem operations for rosids.
//!
//! This crate holds everything that touches the destination tree: the
//! platform attribute access layer and the [`Commander`] implementations the
//! walker delegates to.

mod commander;
pub mod sys;

pub use commander::{Commander, NullCommander, RealCommander, commander_for};
