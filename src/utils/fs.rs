//! Safe filesystem primitives.
//!
//! Everything the pipeline persists goes through [`atomic_write`]: content is
//! staged in a hidden temporary file in the target's own directory and made
//! visible with a single rename, so a concurrent reader of the target path sees
//! either the old content or the new content in full, never a partial write.
//! Staging in the same directory is required — a rename is only atomic within
//! one filesystem.

use crate::error::{Result, UpdateError};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Create `path` and any missing parents.
///
/// Returns an error if `path` exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| UpdateError::filesystem(path, e))?;
    } else if !path.is_dir() {
        return Err(UpdateError::filesystem(
            path,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists but is not a directory",
            ),
        ));
    }
    Ok(())
}

/// Atomically replace the contents of `path` with `content`.
///
/// The temporary file is named `.<file name><random>` next to the target,
/// written in full, given mode `0o644`, synced, and renamed onto `path`. If any
/// step before the rename fails the temporary file is removed; the rename is
/// the only state-changing step.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    debug!("writing {}", path.display());

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            UpdateError::filesystem(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
            )
        })?;
    let file_name = path.file_name().ok_or_else(|| {
        UpdateError::filesystem(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}", file_name.to_string_lossy()))
        .tempfile_in(dir)
        .map_err(|e| UpdateError::filesystem(dir, e))?;

    temp.write_all(content)
        .map_err(|e| UpdateError::filesystem(temp.path(), e))?;
    temp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(|e| UpdateError::filesystem(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| UpdateError::filesystem(temp.path(), e))?;

    // Dropping the PersistError removes the temporary file.
    temp.persist(path)
        .map_err(|e| UpdateError::filesystem(path, e.error))?;
    Ok(())
}

/// Read a symlink's target, resolving a relative target against the link's
/// directory. Returns `None` if `path` does not exist or is not a symlink.
pub fn try_readlink(path: &Path) -> Option<PathBuf> {
    let dest = fs::read_link(path).ok()?;
    if dest.is_absolute() {
        Some(dest)
    } else {
        match path.parent() {
            Some(parent) => Some(parent.join(dest)),
            None => Some(dest),
        }
    }
}

/// Remove a file or symlink, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(UpdateError::filesystem(path, e)),
    }
}
