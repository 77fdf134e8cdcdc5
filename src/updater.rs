//! The top-level update pipeline.
//!
//! [`Updater`] wires the metadata cache, the installer, and the promotion step
//! into the one operation callers actually want: *make sure the latest known
//! release is installed and active, and tell me where it is*.

use crate::cache::MetadataCache;
use crate::config::UpdaterConfig;
use crate::env;
use crate::error::Result;
use crate::installer::Installer;
use crate::paths::RuntimePaths;
use crate::promote::promote;
use crate::transport::{HttpTransport, Transport};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Keeps the helper installed and current under one runtime root.
///
/// Safe to run concurrently from any number of independent processes sharing
/// the same root: every cross-process interaction goes through atomic renames
/// on the filesystem, never through in-process state.
///
/// # Examples
///
/// ```rust,no_run
/// use streamproxy_runtime::{Updater, UpdaterConfig};
///
/// # async fn example() -> Result<(), streamproxy_runtime::UpdateError> {
/// let config = UpdaterConfig::new("/home/user/.local/share/app/winestreamproxy");
/// let updater = Updater::new(config)?;
///
/// let installed = updater.install().await?;
/// println!("active release lives at {}", installed.display());
/// println!("run {}", updater.wrapper_script().display());
/// # Ok(())
/// # }
/// ```
pub struct Updater<T = HttpTransport> {
    config: UpdaterConfig,
    paths: RuntimePaths,
    transport: T,
}

impl Updater<HttpTransport> {
    /// Create an updater using the production HTTP transport.
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Updater<T> {
    /// Create an updater over an explicit transport implementation.
    pub fn with_transport(config: UpdaterConfig, transport: T) -> Self {
        let paths = RuntimePaths::new(&config);
        Self {
            config,
            paths,
            transport,
        }
    }

    /// Bring the latest known release to the active state.
    ///
    /// Acquires release metadata (cached, fresh, or stale per the cache
    /// policy), installs the release's archive if its directory does not exist
    /// yet, and atomically promotes it. Returns the install directory the
    /// active link now points to.
    ///
    /// On failure nothing observable has changed: either an error surfaced
    /// before any filesystem mutation, or a staged artifact was discarded and
    /// the previously active version remains active.
    pub async fn install(&self) -> Result<PathBuf> {
        let cache = MetadataCache::new(&self.config, &self.paths, &self.transport);
        let release = cache.latest().await?;

        let installer = Installer::new(&self.config, &self.paths, &self.transport);
        let installed = installer.ensure_installed(&release).await?;

        promote(&self.paths, &installed, &release.tag_name)?;
        Ok(installed)
    }

    /// The configuration this updater was built with.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// The on-disk layout this updater manages.
    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    /// The transport this updater fetches through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The helper executable, reached through the active link.
    pub fn proxy_exe(&self) -> PathBuf {
        self.paths.proxy_exe()
    }

    /// The launch wrapper, reached through the active link.
    pub fn wrapper_script(&self) -> PathBuf {
        self.paths.wrapper_script()
    }

    /// The environment a consumer of the active installation needs, with the
    /// socket placed in `socket_dir`. Honors a configured channel name.
    pub fn environment(&self, socket_dir: &Path) -> Vec<(&'static str, OsString)> {
        env::environment_with_pipe(socket_dir, &self.config.pipe_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubTransport;

    #[test]
    fn environment_honors_the_configured_pipe_name() {
        let config = UpdaterConfig::new("/tmp/rt").with_pipe_name("game-ipc-1");
        let updater = Updater::with_transport(config, StubTransport::new());

        let env = updater.environment(Path::new("/run/user/1000"));
        assert_eq!(env[0].1, OsString::from("game-ipc-1"));
        assert_eq!(env[1].1, OsString::from("/run/user/1000/game-ipc-1"));
    }

    #[test]
    fn accessor_paths_go_through_the_active_link() {
        let config = UpdaterConfig::new("/rt");
        let updater = Updater::with_transport(config, StubTransport::new());

        assert_eq!(
            updater.proxy_exe(),
            Path::new("/rt/latest/winestreamproxy.exe.so")
        );
        assert_eq!(updater.wrapper_script(), Path::new("/rt/latest/wrapper.sh"));
    }
}
