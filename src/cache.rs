//! TTL-cached acquisition of release metadata, with stale fallback.
//!
//! [`MetadataCache::latest`] is the only way the pipeline learns about
//! releases, and it is deliberately biased toward keeping the application
//! runnable: network or API unavailability must never block a machine that has
//! installed a known-good version before. The policy, in order:
//!
//! 1. A cached document younger than the configured window is parsed and
//!    returned — no network call at all.
//! 2. Otherwise the `latest` endpoint is fetched and the document validated.
//!    On success the raw bytes are persisted atomically and the parsed release
//!    returned.
//! 3. If the fetch, validation, or persist step fails, the cached document is
//!    used regardless of its age, and the failure is logged as a warning.
//! 4. Only when there is no cached document either does the original failure
//!    reach the caller.
//!
//! The age check compares the *absolute* difference between now and the cache
//! file's mtime, so a file stamped in the future (clock skew, restored backup)
//! still counts as fresh rather than forcing a refetch on every call.

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::paths::RuntimePaths;
use crate::release::Release;
use crate::transport::Transport;
use crate::utils::fs::{atomic_write, ensure_dir};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

/// Cached fetcher of the latest release document.
pub struct MetadataCache<'a, T> {
    config: &'a UpdaterConfig,
    paths: &'a RuntimePaths,
    transport: &'a T,
}

/// Absolute distance between `now` and a file timestamp.
fn cache_age(now: SystemTime, mtime: SystemTime) -> Duration {
    match now.duration_since(mtime) {
        Ok(age) => age,
        // mtime is in the future; tolerate the skew instead of refetching
        // on every call until the clock catches up.
        Err(e) => e.duration(),
    }
}

impl<'a, T: Transport> MetadataCache<'a, T> {
    /// Create a cache over the given config, layout, and transport.
    pub fn new(config: &'a UpdaterConfig, paths: &'a RuntimePaths, transport: &'a T) -> Self {
        Self {
            config,
            paths,
            transport,
        }
    }

    /// The latest known release, per the policy described at module level.
    pub async fn latest(&self) -> Result<Release> {
        if let Some(release) = self.fresh_cached().await {
            info!("using cached release info for {}", release.tag_name);
            return Ok(release);
        }

        info!("fetching latest release info");
        match self.fetch_validate_persist().await {
            Ok(release) => Ok(release),
            Err(fetch_err) => {
                warn!("release fetch failed, falling back to cached info: {fetch_err}");
                match self.stale_cached().await {
                    Some(release) => Ok(release),
                    None => Err(fetch_err),
                }
            }
        }
    }

    /// The cached document, if it exists, is fresh, and parses.
    ///
    /// Any failure here is a cache miss, not an error: an unreadable or
    /// corrupt cache file simply forces a fresh fetch.
    async fn fresh_cached(&self) -> Option<Release> {
        let path = self.paths.metadata_cache();
        let mtime = fs::metadata(path).await.ok()?.modified().ok()?;
        if cache_age(SystemTime::now(), mtime) >= self.config.cache_window {
            debug!("cached release info has expired");
            return None;
        }

        let bytes = fs::read(path).await.ok()?;
        match Release::parse(&bytes) {
            Ok(release) => Some(release),
            Err(e) => {
                warn!("cached release info is unreadable, refetching: {e}");
                None
            }
        }
    }

    /// Fetch the `latest` endpoint, validate the document, persist the raw
    /// bytes, and return the parsed release.
    ///
    /// The persist step is inside the fallible envelope on purpose: a document
    /// that could not be cached must not poison the next run, and a failed
    /// write still leaves the previous cache available for fallback.
    async fn fetch_validate_persist(&self) -> Result<Release> {
        let url = self.config.latest_url();
        let raw = self.transport.get(&url).await?;

        let release = Release::parse(&raw)?;
        release.validate(&self.config.asset_pattern)?;

        ensure_dir(self.paths.runtime_root())?;
        atomic_write(self.paths.metadata_cache(), &raw)?;
        debug!("cached release info for {}", release.tag_name);
        Ok(release)
    }

    /// The cached document regardless of age, if it exists and parses.
    async fn stale_cached(&self) -> Option<Release> {
        let bytes = fs::read(self.paths.metadata_cache()).await.ok()?;
        match Release::parse(&bytes) {
            Ok(release) => {
                info!("using stale cached release info for {}", release.tag_name);
                Some(release)
            }
            Err(e) => {
                warn!("stale cached release info is unreadable: {e}");
                None
            }
        }
    }
}
