//! Exclusion rules applied to every visited entry.

use std::path::{Path, PathBuf};

use regex::bytes::{Regex, RegexBuilder};
use rosids_core::{AttributeMask, BackupConfig, ConfigError, path::normalize};
use rosids_ops::sys;
use tracing::debug;

/// Prefix that makes an exclusion pattern case-sensitive.
///
/// Patterns match case-insensitively unless they start with this marker. The
/// marker is removed before the pattern is compiled.
pub const CASE_SENSITIVE_MARKER: &str = "(?#casesensitive)";

/// Decides which directories and files are left out of a backup.
#[derive(Debug, Clone)]
pub struct Filter {
    destination: PathBuf,
    dir_attr_to_exclude: AttributeMask,
    file_attr_to_exclude: AttributeMask,
    patterns: Vec<Regex>,
}

impl Filter {
    /// Build the rule set for a run. Invalid patterns are rejected here.
    pub fn new(config: &BackupConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .exclude_patterns
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            destination: normalize(&config.destination),
            dir_attr_to_exclude: config.dir_attr_to_exclude(),
            file_attr_to_exclude: config.file_attr_to_exclude(),
            patterns,
        })
    }

    /// Check if a directory is excluded.
    ///
    /// The destination itself is always excluded so a destination nested in
    /// the source is never walked into.
    pub fn excludes_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        if path == self.destination {
            return true;
        }
        if has_attr(&path, self.dir_attr_to_exclude) {
            return true;
        }
        self.matches_pattern(&path)
    }

    /// Check if a file is excluded.
    pub fn excludes_file(&self, path: &Path) -> bool {
        let path = normalize(path);
        if has_attr(&path, self.file_attr_to_exclude) {
            return true;
        }
        self.matches_pattern(&path)
    }

    fn matches_pattern(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let bytes = path.as_os_str().as_encoded_bytes();
        self.patterns.iter().any(|pattern| pattern.is_match(bytes))
    }
}

/// Compile one exclusion pattern, honoring the case-sensitivity marker.
fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let (source, case_sensitive) = match pattern.strip_prefix(CASE_SENSITIVE_MARKER) {
        Some(rest) => (rest, true),
        None => (pattern, false),
    };

    RegexBuilder::new(source)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Whether the path carries any bit of `mask`.
///
/// Unreadable attributes do not exclude; the action on the path will report
/// the failure.
fn has_attr(path: &Path, mask: AttributeMask) -> bool {
    if mask.is_empty() {
        return false;
    }
    match sys::get_attributes(path) {
        Ok(attrs) => attrs.intersects(mask),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot read attributes");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(destination: &Path, patterns: &[&str]) -> BackupConfig {
        BackupConfig::builder()
            .source("/src")
            .link_source("/prev")
            .destination(destination)
            .exclude_patterns(patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>())
            .build()
            .unwrap()
    }

    #[test]
    fn test_excludes_destination() {
        let filter = Filter::new(&config(Path::new("/src/backup"), &[])).unwrap();

        assert!(filter.excludes_dir(Path::new("/src/backup")));
        assert!(filter.excludes_dir(Path::new("/src/./backup/")));
        assert!(filter.excludes_dir(Path::new("/src/other/../backup")));
        assert!(!filter.excludes_dir(Path::new("/src/backup2")));
        assert!(!filter.excludes_dir(Path::new("/src")));
    }

    #[test]
    fn test_destination_does_not_exclude_files() {
        let filter = Filter::new(&config(Path::new("/src/backup"), &[])).unwrap();
        assert!(!filter.excludes_file(Path::new("/src/backup")));
    }

    #[test]
    fn test_patterns_are_case_insensitive_by_default() {
        let filter = Filter::new(&config(Path::new("/dst"), &[r"\.tmp$"])).unwrap();

        assert!(filter.excludes_file(Path::new("/src/x.tmp")));
        assert!(filter.excludes_file(Path::new("/src/X.TMP")));
        assert!(!filter.excludes_file(Path::new("/src/x.tmpl")));
    }

    #[test]
    fn test_case_sensitive_marker() {
        let pattern = format!("{CASE_SENSITIVE_MARKER}Cache");
        let filter = Filter::new(&config(Path::new("/dst"), &[&pattern])).unwrap();

        assert!(filter.excludes_dir(Path::new("/src/Cache")));
        assert!(!filter.excludes_dir(Path::new("/src/cache")));
    }

    #[test]
    fn test_patterns_match_full_path() {
        let filter = Filter::new(&config(Path::new("/dst"), &["node_modules"])).unwrap();

        assert!(filter.excludes_dir(Path::new("/src/app/node_modules")));
        assert!(filter.excludes_file(Path::new("/src/app/node_modules/pkg/index.js")));
        assert!(!filter.excludes_file(Path::new("/src/app/index.js")));
    }

    #[cfg(unix)]
    #[test]
    fn test_patterns_see_raw_path_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // Latin-1 e-acute, not valid UTF-8 on its own
        let filter = Filter::new(&config(Path::new("/dst"), &[r"caf(?-u:\xE9)\.txt$"])).unwrap();

        let latin1 = Path::new(OsStr::from_bytes(b"/src/caf\xE9.txt"));
        assert!(filter.excludes_file(latin1));
        assert!(!filter.excludes_file(Path::new("/src/caf\u{e9}.txt")));
        assert!(!filter.excludes_file(Path::new("/src/caf\u{fffd}.txt")));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = Filter::new(&config(Path::new("/dst"), &["(unclosed"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_filter_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.TMP");
        fs::write(&file, "x").unwrap();

        let config = config(&temp.path().join("dst"), &[r"\.tmp$", "cache"]);
        let first = Filter::new(&config).unwrap();
        let second = Filter::new(&config).unwrap();

        let cache = temp.path().join("cache");
        for path in [file.as_path(), temp.path(), cache.as_path()] {
            assert_eq!(first.excludes_file(path), second.excludes_file(path));
            assert_eq!(first.excludes_dir(path), second.excludes_dir(path));
            assert_eq!(first.excludes_file(path), first.excludes_file(path));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exclude_junctions() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut config = config(&temp.path().join("dst"), &[]);
        assert!(!Filter::new(&config).unwrap().excludes_dir(&link));

        config.exclude_dir_junctions = true;
        let filter = Filter::new(&config).unwrap();
        assert!(filter.excludes_dir(&link));
        assert!(!filter.excludes_dir(&real));
    }

    #[cfg(unix)]
    #[test]
    fn test_exclude_file_by_hidden_attribute() {
        let temp = TempDir::new().unwrap();
        let hidden = temp.path().join(".env");
        let visible = temp.path().join("env");
        fs::write(&hidden, "x").unwrap();
        fs::write(&visible, "x").unwrap();

        let mut config = config(&temp.path().join("dst"), &[]);
        config.exclude_file_by_attr =
            AttributeMask::parse("H", rosids_core::EXCLUDABLE_FILE_ATTRIBUTES).unwrap();
        let filter = Filter::new(&config).unwrap();

        assert!(filter.excludes_file(&hidden));
        assert!(!filter.excludes_file(&visible));
        // The file mask never applies to directories
        assert!(!filter.excludes_dir(&hidden));
    }

    #[test]
    fn test_missing_path_is_not_excluded_by_attributes() {
        let temp = TempDir::new().unwrap();
        let mut config = config(&temp.path().join("dst"), &[]);
        config.exclude_file_by_attr =
            AttributeMask::parse("R", rosids_core::EXCLUDABLE_FILE_ATTRIBUTES).unwrap();
        let filter = Filter::new(&config).unwrap();

        assert!(!filter.excludes_file(&temp.path().join("missing")));
    }
}
