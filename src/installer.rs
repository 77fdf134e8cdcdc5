//! Download and staged extraction of release archives.
//!
//! An install directory is immutable once it exists: its existence *is* the
//! record that the version is installed, so [`Installer::ensure_installed`] is
//! idempotent and free for already-present tags. New versions are built off to
//! the side in a hidden staging directory and made visible with a single
//! rename, so the final `extracted.<tag>` name never exists in a partially
//! extracted state — a concurrent reader either finds a complete installation
//! or nothing.
//!
//! Multiple independent processes may race to install the same tag. The policy
//! is first-writer-wins: if the final rename fails because the destination
//! already exists, the other writer's completed install is accepted and the
//! local staging copy is discarded.

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::paths::RuntimePaths;
use crate::release::Release;
use crate::transport::Transport;
use crate::utils::fs::ensure_dir;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Installs release archives into versioned directories.
pub struct Installer<'a, T> {
    config: &'a UpdaterConfig,
    paths: &'a RuntimePaths,
    transport: &'a T,
}

impl<'a, T: Transport> Installer<'a, T> {
    /// Create an installer over the given config, layout, and transport.
    pub fn new(config: &'a UpdaterConfig, paths: &'a RuntimePaths, transport: &'a T) -> Self {
        Self {
            config,
            paths,
            transport,
        }
    }

    /// Ensure the release's install directory exists, downloading and
    /// extracting its archive if it does not. Returns the install directory.
    pub async fn ensure_installed(&self, release: &Release) -> Result<PathBuf> {
        let target = self.paths.install_dir(&release.tag_name);
        if target.exists() {
            debug!("release {} is already installed", release.tag_name);
            return Ok(target);
        }

        let url = release.download_url(&self.config.asset_pattern)?;
        info!("downloading release {} from {url}", release.tag_name);
        ensure_dir(self.paths.runtime_root())?;

        let archive = self.transport.get(url).await?;
        self.extract_into_place(&archive, &target)?;
        info!(
            "installed release {} at {}",
            release.tag_name,
            target.display()
        );
        Ok(target)
    }

    /// Extract `archive` into a hidden staging directory next to `target`,
    /// then rename it onto `target`.
    ///
    /// The staging directory is always gone when this returns: renamed on
    /// success, removed on failure or on a lost install race.
    fn extract_into_place(&self, archive: &[u8], target: &Path) -> Result<()> {
        let parent = target.parent().ok_or_else(|| {
            UpdateError::filesystem(
                target,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no parent"),
            )
        })?;
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .tempdir_in(parent)
            .map_err(|e| UpdateError::filesystem(parent, e))?
            .keep();

        if let Err(err) = unpack_archive(archive, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        match fs::rename(&staging, target) {
            Ok(()) => Ok(()),
            Err(_) if target.is_dir() => {
                // Lost the race: another process renamed its completed
                // staging directory onto the target first.
                debug!(
                    "{} appeared concurrently, discarding staging copy",
                    target.display()
                );
                let _ = fs::remove_dir_all(&staging);
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                Err(UpdateError::filesystem(target, e))
            }
        }
    }
}

/// Unpack a (possibly gzip-compressed) tar archive into `dest` and set the
/// directory to mode `0o755`.
fn unpack_archive(archive: &[u8], dest: &Path) -> Result<()> {
    let reader: Box<dyn Read + '_> = if archive.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(archive))
    } else {
        Box::new(archive)
    };

    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| UpdateError::Extraction {
            reason: e.to_string(),
        })?;

    fs::set_permissions(dest, fs::Permissions::from_mode(0o755))
        .map_err(|e| UpdateError::filesystem(dest, e))?;
    Ok(())
}
