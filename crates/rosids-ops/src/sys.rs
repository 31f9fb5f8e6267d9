//! Platform attribute access, hardlinks and attribute-preserving copies.
//!
//! On Windows the attribute mask is the real `FILE_ATTRIBUTE_*` value. Unix
//! has no such thing, so the mask is derived instead:
//!
//! - read-only: no write permission bit is set
//! - hidden: the name starts with a dot
//! - reparse point: the path is a symbolic link
//!
//! Only read-only can be written back on Unix; other bits are ignored there.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use filetime::FileTime;
use rosids_core::AttributeMask;

/// Read the attribute mask of a path without following a final link.
pub fn get_attributes(path: &Path) -> io::Result<AttributeMask> {
    let metadata = fs::symlink_metadata(path)?;
    Ok(attributes_from(path, &metadata))
}

/// Replace the attribute mask of a path.
pub fn set_attributes(path: &Path, mask: AttributeMask) -> io::Result<()> {
    apply_attributes(path, mask)
}

/// Create `link` as a hardlink to `original`.
pub fn hard_link(original: &Path, link: &Path) -> io::Result<()> {
    fs::hard_link(original, link)
}

/// Copy a file's content, permissions and modification time. On Windows the
/// whole attribute mask is carried over.
///
/// Fails if `dst` already exists. A `dst` this call created is removed again
/// when the copy fails part way. Returns the number of bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut reader = File::open(src)?;
    let metadata = reader.metadata()?;
    let writer = File::create_new(dst)?;

    fill_copy(&mut reader, writer, src, dst, &metadata).inspect_err(|_| {
        let _ = fs::remove_file(dst);
    })
}

fn fill_copy(
    reader: &mut File,
    mut writer: File,
    src: &Path,
    dst: &Path,
    metadata: &fs::Metadata,
) -> io::Result<u64> {
    let bytes = io::copy(reader, &mut writer)?;
    let mtime = FileTime::from_last_modification_time(metadata);
    filetime::set_file_handle_times(&writer, None, Some(mtime))?;
    writer.set_permissions(metadata.permissions())?;
    drop(writer);

    if cfg!(windows) {
        let bits = attributes_from(src, metadata).bits() & !AttributeMask::REPARSE_POINT.bits();
        apply_attributes(dst, AttributeMask::from_bits(bits))?;
    }

    Ok(bytes)
}

// Platform helpers

#[cfg(windows)]
fn attributes_from(_path: &Path, metadata: &fs::Metadata) -> AttributeMask {
    use std::os::windows::fs::MetadataExt;
    AttributeMask::from_bits(metadata.file_attributes())
}

#[cfg(windows)]
fn apply_attributes(path: &Path, mask: AttributeMask) -> io::Result<()> {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::SetFileAttributesW;

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: `wide` is a NUL-terminated UTF-16 string that outlives the call.
    let ok = unsafe { SetFileAttributesW(wide.as_ptr(), mask.bits()) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(windows))]
fn attributes_from(path: &Path, metadata: &fs::Metadata) -> AttributeMask {
    use rosids_core::Attribute;

    let mut mask = AttributeMask::EMPTY;
    if metadata.permissions().readonly() {
        mask = mask.with(Attribute::ReadOnly);
    }
    let hidden = path
        .file_name()
        .is_some_and(|name| name.as_encoded_bytes().starts_with(b"."));
    if hidden {
        mask = mask.with(Attribute::Hidden);
    }
    if metadata.file_type().is_symlink() {
        mask |= AttributeMask::REPARSE_POINT;
    }
    mask
}

#[cfg(unix)]
fn apply_attributes(path: &Path, mask: AttributeMask) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use rosids_core::Attribute;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    let new_mode = if mask.contains(Attribute::ReadOnly) {
        mode & !0o222
    } else if permissions.readonly() {
        mode | 0o200
    } else {
        mode
    };
    if new_mode != mode {
        permissions.set_mode(new_mode);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn apply_attributes(path: &Path, mask: AttributeMask) -> io::Result<()> {
    use rosids_core::Attribute;

    let mut permissions = fs::metadata(path)?.permissions();
    let readonly = mask.contains(Attribute::ReadOnly);
    if permissions.readonly() != readonly {
        permissions.set_readonly(readonly);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
