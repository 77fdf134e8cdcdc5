//! Atomic promotion of an installed version to "active".
//!
//! The active version is whatever the `latest` symlink resolves to. Repointing
//! it is done by creating a tag-qualified temporary link and renaming it onto
//! the canonical name: a rename replaces the directory entry itself, so any
//! process resolving `latest` sees either the old complete installation or the
//! new complete installation, never an intermediate state. This is the one
//! coordination primitive the whole crate rests on — no locks, no daemon.
//!
//! After a successful swap the superseded install directory is garbage
//! collected, best-effort and heavily guarded: the previous link target is
//! only removed if it resolves to a directory directly under the runtime root
//! carrying the versioned-install naming convention. A tampered or hand-edited
//! link can therefore never cause deletion outside the managed directory. GC
//! failures are logged and discarded — an orphaned old version is acceptable,
//! a broken active link is not.

use crate::error::{Result, UpdateError};
use crate::paths::{INSTALL_DIR_PREFIX, RuntimePaths};
use crate::utils::fs::{remove_file_if_exists, try_readlink};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tracing::{debug, info, warn};

/// Atomically repoint the active link at `installed` and garbage-collect the
/// version it supersedes.
///
/// Idempotent: if the link already resolves to `installed`, nothing happens.
/// An absent link is valid (first install).
pub fn promote(paths: &RuntimePaths, installed: &Path, tag: &str) -> Result<()> {
    let active = paths.active_link();
    let previous = try_readlink(active);
    if previous.as_deref() == Some(installed) {
        debug!("release {tag} is already active");
        return Ok(());
    }

    let temp_link = paths.promotion_link(tag);
    remove_file_if_exists(&temp_link)?;
    symlink(installed, &temp_link).map_err(|e| UpdateError::filesystem(&temp_link, e))?;
    if let Err(e) = fs::rename(&temp_link, active) {
        let _ = fs::remove_file(&temp_link);
        return Err(UpdateError::filesystem(active, e));
    }
    info!("release {tag} is now active");

    if let Some(old) = previous {
        collect_superseded(paths, &old, installed);
    }
    Ok(())
}

/// Best-effort removal of the previous link target. Never fails the promotion.
fn collect_superseded(paths: &RuntimePaths, old: &Path, installed: &Path) {
    let Ok(old_real) = old.canonicalize() else {
        debug!("previous target {} is already gone", old.display());
        return;
    };
    let installed_real = installed
        .canonicalize()
        .unwrap_or_else(|_| installed.to_path_buf());
    if old_real == installed_real {
        return;
    }

    if !old_real.is_dir() || !is_managed_install_dir(paths.runtime_root(), &old_real) {
        warn!(
            "previous target {} is not a managed install directory, leaving it in place",
            old_real.display()
        );
        return;
    }

    match fs::remove_dir_all(&old_real) {
        Ok(()) => info!("removed superseded release at {}", old_real.display()),
        // a concurrent promotion may have collected it first
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "failed to remove superseded release at {}: {e}",
            old_real.display()
        ),
    }
}

/// Whether `candidate` (already canonicalized) lives directly under the
/// runtime root and carries the versioned-install naming convention.
fn is_managed_install_dir(root: &Path, candidate: &Path) -> bool {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    candidate.parent() == Some(root.as_path())
        && candidate
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(INSTALL_DIR_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdaterConfig;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RuntimePaths) {
        let dir = TempDir::new().unwrap();
        let paths = RuntimePaths::new(&UpdaterConfig::new(dir.path()));
        (dir, paths)
    }

    fn make_install(paths: &RuntimePaths, tag: &str) -> std::path::PathBuf {
        let dir = paths.install_dir(tag);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("winestreamproxy.exe.so"), tag).unwrap();
        dir
    }

    #[test]
    fn first_promotion_creates_the_link() {
        let (_dir, paths) = setup();
        let installed = make_install(&paths, "v1.2.0");

        promote(&paths, &installed, "v1.2.0").unwrap();

        assert_eq!(try_readlink(paths.active_link()), Some(installed));
        assert!(!paths.promotion_link("v1.2.0").exists());
    }

    #[test]
    fn repromotion_is_a_no_op() {
        let (_dir, paths) = setup();
        let installed = make_install(&paths, "v1.2.0");

        promote(&paths, &installed, "v1.2.0").unwrap();
        promote(&paths, &installed, "v1.2.0").unwrap();

        assert_eq!(try_readlink(paths.active_link()), Some(installed.clone()));
        assert!(installed.is_dir());
    }

    #[test]
    fn promotion_retargets_and_collects_the_old_version() {
        let (_dir, paths) = setup();
        let old = make_install(&paths, "v1.2.0");
        let new = make_install(&paths, "v1.3.0");
        promote(&paths, &old, "v1.2.0").unwrap();

        promote(&paths, &new, "v1.3.0").unwrap();

        assert_eq!(try_readlink(paths.active_link()), Some(new));
        assert!(!old.exists());
        assert!(!paths.promotion_link("v1.3.0").exists());
    }

    #[test]
    fn unmanaged_link_target_is_never_deleted() {
        let (_dir, paths) = setup();
        let outside = TempDir::new().unwrap();
        fs::create_dir_all(paths.runtime_root()).unwrap();
        symlink(outside.path(), paths.active_link()).unwrap();

        let new = make_install(&paths, "v1.3.0");
        promote(&paths, &new, "v1.3.0").unwrap();

        assert!(outside.path().is_dir());
        assert_eq!(try_readlink(paths.active_link()), Some(new));
    }

    #[test]
    fn target_without_install_prefix_is_preserved() {
        let (_dir, paths) = setup();
        let keep = paths.runtime_root().join("keepme");
        fs::create_dir_all(&keep).unwrap();
        symlink(&keep, paths.active_link()).unwrap();

        let new = make_install(&paths, "v1.3.0");
        promote(&paths, &new, "v1.3.0").unwrap();

        assert!(keep.is_dir());
    }

    #[test]
    fn dangling_previous_link_is_tolerated() {
        let (_dir, paths) = setup();
        fs::create_dir_all(paths.runtime_root()).unwrap();
        symlink(paths.runtime_root().join("extracted.gone"), paths.active_link()).unwrap();

        let new = make_install(&paths, "v1.3.0");
        promote(&paths, &new, "v1.3.0").unwrap();

        assert_eq!(try_readlink(paths.active_link()), Some(new));
    }

    #[test]
    fn leftover_temp_link_from_a_crash_is_replaced() {
        let (_dir, paths) = setup();
        let installed = make_install(&paths, "v1.2.0");
        symlink("/stale/target", paths.promotion_link("v1.2.0")).unwrap();

        promote(&paths, &installed, "v1.2.0").unwrap();

        assert_eq!(try_readlink(paths.active_link()), Some(installed));
        assert!(!paths.promotion_link("v1.2.0").exists());
    }
}
