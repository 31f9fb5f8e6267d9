//! The actions a backup performs on the destination tree.

use std::fs;
use std::path::Path;

use rosids_core::{Attribute, AttributeMask, BackupConfig, OpError, Operation};
use tracing::debug;

use crate::sys;

/// Performs every filesystem change a backup makes.
///
/// The walker only ever talks to this trait, so a dry run and a real run make
/// exactly the same decisions and produce the same report.
pub trait Commander {
    /// Create a directory and all missing parents.
    fn make_dirs(&self, path: &Path) -> Result<(), OpError>;

    /// Create the directory `dst` with the attributes of directory `src`.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<(), OpError>;

    /// Copy file `src` to the new path `dst`.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), OpError>;

    /// Create `dst` as a hardlink to the existing file `src`.
    fn link_file(&self, src: &Path, dst: &Path) -> Result<(), OpError>;
}

/// Build the commander a configuration asks for.
pub fn commander_for(config: &BackupConfig) -> Box<dyn Commander> {
    if config.list_only {
        debug!("list only, nothing will be written");
        Box::new(NullCommander)
    } else {
        debug!(add_file_attr = %config.add_file_attr, "writing snapshot");
        Box::new(RealCommander::new().with_file_attr_to_add(config.add_file_attr))
    }
}

/// Commander that changes the filesystem.
#[derive(Debug, Clone, Default)]
pub struct RealCommander {
    file_attr_to_add: AttributeMask,
}

impl RealCommander {
    /// Create a commander that copies files as they are.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add these attributes to every copied file.
    pub fn with_file_attr_to_add(mut self, mask: AttributeMask) -> Self {
        self.file_attr_to_add = mask;
        self
    }
}

impl Commander for RealCommander {
    fn make_dirs(&self, path: &Path) -> Result<(), OpError> {
        debug!(path = %path.display(), "creating directory tree");
        fs::create_dir_all(path).map_err(OpError::with(Operation::CreateDirectory, path))
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<(), OpError> {
        fs::create_dir(dst).map_err(OpError::with(Operation::CreateDirectory, dst))?;
        let mut attrs =
            sys::get_attributes(src).map_err(OpError::with(Operation::GetAttributes, src))?;
        // Unix read-only means no write bit, and children still have to be
        // created inside the new directory.
        if cfg!(not(windows)) {
            attrs = attrs.without(Attribute::ReadOnly);
        }
        sys::set_attributes(dst, attrs).map_err(OpError::with(Operation::SetAttributes, dst))
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), OpError> {
        sys::copy_file(src, dst).map_err(OpError::with(Operation::Copy, dst))?;
        if !self.file_attr_to_add.is_empty() {
            let attrs =
                sys::get_attributes(dst).map_err(OpError::with(Operation::GetAttributes, dst))?;
            sys::set_attributes(dst, attrs | self.file_attr_to_add)
                .map_err(OpError::with(Operation::SetAttributes, dst))?;
        }
        Ok(())
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<(), OpError> {
        sys::hard_link(src, dst).map_err(OpError::with(Operation::Link, dst))
    }
}

/// Commander for list-only runs: accepts every call and changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCommander;

impl Commander for NullCommander {
    fn make_dirs(&self, _path: &Path) -> Result<(), OpError> {
        Ok(())
    }

    fn copy_dir(&self, _src: &Path, _dst: &Path) -> Result<(), OpError> {
        Ok(())
    }

    fn copy_file(&self, _src: &Path, _dst: &Path) -> Result<(), OpError> {
        Ok(())
    }

    fn link_file(&self, _src: &Path, _dst: &Path) -> Result<(), OpError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosids_core::ADDABLE_FILE_ATTRIBUTES;
    use tempfile::TempDir;

    #[test]
    fn test_real_copy_file_adds_attributes() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "data").unwrap();

        let mask = AttributeMask::parse("R", ADDABLE_FILE_ATTRIBUTES).unwrap();
        RealCommander::new()
            .with_file_attr_to_add(mask)
            .copy_file(&src, &dst)
            .unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
        assert!(sys::get_attributes(&dst).unwrap().contains(Attribute::ReadOnly));
        assert!(!sys::get_attributes(&src).unwrap().contains(Attribute::ReadOnly));

        // Let the temp dir clean up on every platform
        let attrs = sys::get_attributes(&dst).unwrap();
        sys::set_attributes(&dst, attrs.without(Attribute::ReadOnly)).unwrap();
    }

    #[test]
    fn test_real_copy_dir_is_not_recursive() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("inner.txt"), "x").unwrap();

        let dst = temp.path().join("dst");
        RealCommander::new().copy_dir(&src, &dst).unwrap();

        assert!(dst.is_dir());
        assert!(!dst.join("inner.txt").exists());
    }

    #[test]
    fn test_real_copy_dir_fails_without_parent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();

        let err = RealCommander::new()
            .copy_dir(&src, &temp.path().join("missing/dst"))
            .unwrap_err();
        assert_eq!(err.op, Operation::CreateDirectory);
    }

    #[test]
    fn test_null_commander_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let commander = NullCommander;

        commander.make_dirs(&temp.path().join("x/y/z")).unwrap();
        commander.copy_dir(temp.path(), &temp.path().join("d")).unwrap();
        commander.copy_file(&src, &temp.path().join("b.txt")).unwrap();
        commander.link_file(&src, &temp.path().join("c.txt")).unwrap();

        let names: Vec<_> = fs::read_dir(temp.path()).unwrap().flatten().collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_commander_for_list_only() {
        let temp = TempDir::new().unwrap();
        let config = BackupConfig::builder()
            .source(temp.path())
            .link_source(temp.path())
            .destination(temp.path().join("dst"))
            .list_only(true)
            .build()
            .unwrap();

        commander_for(&config).make_dirs(&config.destination).unwrap();
        assert!(!config.destination.exists());
    }
}
