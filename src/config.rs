//! Updater configuration.
//!
//! All tunable values of the update pipeline live in a single immutable
//! [`UpdaterConfig`] constructed once at process start and passed explicitly to
//! every component. Nothing in this crate reads process-wide state; two updaters
//! with different configs can coexist in one process (the test suite relies on
//! this).
//!
//! The defaults target the winestreamproxy releases published on GitHub and
//! mirror the behavior of the helper's upstream distribution: release metadata is
//! considered fresh for 24 hours, and the downloadable asset is the x86_64
//! tarball.

use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// GitHub releases collection for the winestreamproxy helper.
pub const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/openglfreak/winestreamproxy/releases";

/// Name pattern of the downloadable asset: the x86_64 tarball, with or without
/// a compression suffix (`.tar`, `.tar.gz`, `.tar.xz`, ...).
pub const DEFAULT_ASSET_PATTERN: &str = r"^winestreamproxy-.*\.x86_64\.tar(?:\.[^.]+)?$";

/// How long a cached release document counts as fresh (24 hours).
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(86_400);

/// Logical channel name the helper listens on.
pub const DEFAULT_PIPE_NAME: &str = "discord-ipc-0";

/// Immutable configuration for one update pipeline.
///
/// Construct with [`UpdaterConfig::new`], which wires the winestreamproxy
/// defaults, then override individual fields with the builder methods:
///
/// ```rust
/// use std::time::Duration;
/// use streamproxy_runtime::UpdaterConfig;
///
/// let config = UpdaterConfig::new("/home/user/.local/share/app/winestreamproxy")
///     .with_cache_window(Duration::from_secs(3600));
/// assert!(config.latest_url().ends_with("/latest"));
/// ```
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Directory under which everything this crate manages lives: the metadata
    /// cache, the versioned install directories, and the active-version link.
    pub runtime_root: PathBuf,
    /// Base URL of the releases collection. `{releases_url}/latest` must answer
    /// with the release JSON document of the newest published version.
    pub releases_url: String,
    /// Pattern an asset name must match to be considered downloadable.
    pub asset_pattern: Regex,
    /// Maximum age of the cached release document before a fresh fetch is
    /// attempted.
    pub cache_window: Duration,
    /// Channel name exported to consumers of the active installation.
    pub pipe_name: String,
}

impl UpdaterConfig {
    /// Create a config rooted at `runtime_root` with the winestreamproxy
    /// defaults for everything else.
    pub fn new(runtime_root: impl Into<PathBuf>) -> Self {
        Self {
            runtime_root: runtime_root.into(),
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            asset_pattern: Regex::new(DEFAULT_ASSET_PATTERN)
                .expect("default asset pattern is a valid regex"),
            cache_window: DEFAULT_CACHE_WINDOW,
            pipe_name: DEFAULT_PIPE_NAME.to_string(),
        }
    }

    /// Override the releases collection URL.
    pub fn with_releases_url(mut self, url: impl Into<String>) -> Self {
        self.releases_url = url.into();
        self
    }

    /// Override the asset name pattern.
    pub fn with_asset_pattern(mut self, pattern: Regex) -> Self {
        self.asset_pattern = pattern;
        self
    }

    /// Override the cache freshness window.
    pub fn with_cache_window(mut self, window: Duration) -> Self {
        self.cache_window = window;
        self
    }

    /// Override the channel name exported to consumers.
    pub fn with_pipe_name(mut self, name: impl Into<String>) -> Self {
        self.pipe_name = name.into();
        self
    }

    /// URL of the "latest release" endpoint.
    pub fn latest_url(&self) -> String {
        format!("{}/latest", self.releases_url)
    }
}
