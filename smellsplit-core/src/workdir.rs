//! Working-directory lifecycle: idempotent create/clear and removal that
//! survives read-only artifacts left behind by earlier checkouts.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::FsError;

/// Make sure `path` exists as a directory.
///
/// With `clear` set, an existing directory is removed recursively and
/// recreated empty. Without it, an existing path is left untouched.
pub fn ensure_directory(path: &Path, clear: bool) -> Result<(), FsError> {
    if path.exists() {
        if !clear {
            return Ok(());
        }
        remove_directory(path)?;
    }
    std::fs::create_dir_all(path).map_err(|e| FsError::new("create", path, e))?;
    debug!(path = %path.display(), clear, "Directory ready");
    Ok(())
}

/// Remove a directory tree. A missing path is not an error.
///
/// On permission-denied the tree's permissions are reset to read/write/execute
/// and removal is retried once; any other error, or a second failure, propagates.
pub fn remove_directory(path: &Path) -> Result<(), FsError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            warn!(path = %path.display(), "Read-only artifacts found, resetting permissions");
            reset_permissions(path).map_err(|e| FsError::new("reset permissions of", path, e))?;
            std::fs::remove_dir_all(path).map_err(|e| FsError::new("remove", path, e))
        }
        Err(e) => Err(FsError::new("remove", path, e)),
    }
}

/// Copy one structural unit into a bucket, overwriting a previous copy.
pub fn copy_unit(from: &Path, to: &Path) -> Result<(), FsError> {
    std::fs::copy(from, to).map_err(|e| FsError::new("copy to", to, e))?;
    Ok(())
}

/// Sorted names of the entries directly under `dir`, exactly as stored on disk.
pub fn list_entries(dir: &Path) -> Result<Vec<OsString>, FsError> {
    let read = std::fs::read_dir(dir).map_err(|e| FsError::new("list", dir, e))?;
    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| FsError::new("list", dir, e))?;
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

fn reset_permissions(path: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    std::fs::set_permissions(path, full_access(meta.permissions()))?;
    if meta.is_dir() {
        for entry in std::fs::read_dir(path)? {
            reset_permissions(&entry?.path())?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn full_access(_current: std::fs::Permissions) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    std::fs::Permissions::from_mode(0o777)
}

#[cfg(not(unix))]
fn full_access(mut current: std::fs::Permissions) -> std::fs::Permissions {
    current.set_readonly(false);
    current
}
