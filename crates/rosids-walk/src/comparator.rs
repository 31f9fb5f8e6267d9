//! Same-file test used to decide between linking and copying.

use std::fs;
use std::path::Path;

/// Treats two files as the same when size and modification time match.
///
/// Content is never read, so two different files with equal size and mtime
/// compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator;

impl Comparator {
    /// Create a new comparator.
    pub fn new() -> Self {
        Self
    }

    /// Whether `source` can be replaced by a hardlink to `link_source`.
    ///
    /// Both must be regular files (after following links) with exactly equal
    /// modification times and sizes. Unreadable metadata means "not the same".
    pub fn is_same_file(&self, source: &Path, link_source: &Path) -> bool {
        let (Ok(lft), Ok(rgt)) = (fs::metadata(source), fs::metadata(link_source)) else {
            return false;
        };
        if !lft.is_file() || !rgt.is_file() {
            return false;
        }
        match (lft.modified(), rgt.modified()) {
            (Ok(lft_mtime), Ok(rgt_mtime)) if lft_mtime == rgt_mtime => lft.len() == rgt.len(),
            _ => false,
        }
    }
}
