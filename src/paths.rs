//! On-disk layout of the managed runtime directory.
//!
//! Every path this crate touches is derived here, from the configured runtime
//! root, and nowhere else. The layout is:
//!
//! ```text
//! <runtime_root>/
//! ├── latest.json          cached raw release document
//! ├── latest               symlink to the active install directory
//! ├── latest.<tag>         transient link used during an atomic swap
//! └── extracted.<tag>/     one immutable directory per installed version
//! ```
//!
//! [`RuntimePaths`] is pure: construction and every accessor are infallible and
//! perform no I/O.

use crate::config::UpdaterConfig;
use std::path::{Path, PathBuf};

/// File holding the cached raw release document.
pub const METADATA_CACHE_FILE: &str = "latest.json";

/// Name of the symlink pointing at the active install directory.
pub const ACTIVE_LINK_NAME: &str = "latest";

/// Prefix of every versioned install directory.
pub const INSTALL_DIR_PREFIX: &str = "extracted.";

/// The helper executable inside an install directory.
pub const PROXY_EXE_NAME: &str = "winestreamproxy.exe.so";

/// The launch wrapper inside an install directory.
pub const WRAPPER_SCRIPT_NAME: &str = "wrapper.sh";

/// Paths of the managed runtime directory, derived once from an
/// [`UpdaterConfig`].
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    runtime_root: PathBuf,
    metadata_cache: PathBuf,
    active_link: PathBuf,
}

impl RuntimePaths {
    /// Derive the layout for the config's runtime root.
    pub fn new(config: &UpdaterConfig) -> Self {
        let runtime_root = config.runtime_root.clone();
        Self {
            metadata_cache: runtime_root.join(METADATA_CACHE_FILE),
            active_link: runtime_root.join(ACTIVE_LINK_NAME),
            runtime_root,
        }
    }

    /// The directory everything lives under.
    pub fn runtime_root(&self) -> &Path {
        &self.runtime_root
    }

    /// The cached release document.
    pub fn metadata_cache(&self) -> &Path {
        &self.metadata_cache
    }

    /// The active-version symlink.
    pub fn active_link(&self) -> &Path {
        &self.active_link
    }

    /// The helper executable, reached through the active link.
    pub fn proxy_exe(&self) -> PathBuf {
        self.active_link.join(PROXY_EXE_NAME)
    }

    /// The launch wrapper, reached through the active link.
    pub fn wrapper_script(&self) -> PathBuf {
        self.active_link.join(WRAPPER_SCRIPT_NAME)
    }

    /// The install directory for a version tag.
    pub fn install_dir(&self, tag: &str) -> PathBuf {
        self.runtime_root.join(format!("{INSTALL_DIR_PREFIX}{tag}"))
    }

    /// The transient link name used while atomically repointing the active
    /// link at the install directory for `tag`.
    pub fn promotion_link(&self, tag: &str) -> PathBuf {
        self.runtime_root.join(format!("{ACTIVE_LINK_NAME}.{tag}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> RuntimePaths {
        RuntimePaths::new(&UpdaterConfig::new("/rt/winestreamproxy"))
    }

    #[test]
    fn layout_derives_from_root() {
        let p = paths();
        assert_eq!(p.metadata_cache(), Path::new("/rt/winestreamproxy/latest.json"));
        assert_eq!(p.active_link(), Path::new("/rt/winestreamproxy/latest"));
        assert_eq!(
            p.proxy_exe(),
            Path::new("/rt/winestreamproxy/latest/winestreamproxy.exe.so")
        );
        assert_eq!(
            p.wrapper_script(),
            Path::new("/rt/winestreamproxy/latest/wrapper.sh")
        );
    }

    #[test]
    fn versioned_names_embed_the_tag() {
        let p = paths();
        assert_eq!(
            p.install_dir("v2.0.3"),
            Path::new("/rt/winestreamproxy/extracted.v2.0.3")
        );
        assert_eq!(
            p.promotion_link("v2.0.3"),
            Path::new("/rt/winestreamproxy/latest.v2.0.3")
        );
    }
}
