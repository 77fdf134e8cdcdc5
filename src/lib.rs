//! streamproxy-runtime — keeps the winestreamproxy helper installed and current.
//!
//! The winestreamproxy helper bridges a named pipe inside a Wine prefix to a
//! Unix socket on the host, and is distributed as versioned release tarballs.
//! This crate owns one runtime directory and keeps a ready-to-run copy of the
//! latest release in it: it checks the release API (with a 24-hour metadata
//! cache and a stale fallback when the network is down), downloads and unpacks
//! versions that are not installed yet, and atomically flips a `latest`
//! symlink to the freshly installed version.
//!
//! # Guarantees
//!
//! Any number of independent processes may run [`Updater::install`] against
//! the same runtime root concurrently, with no locks and no daemon. A reader
//! resolving the `latest` link at any instant sees a fully installed,
//! self-consistent version — never a half-extracted directory or a dangling
//! link. The only primitives relied upon are the atomicity of `rename(2)` and
//! of symlink-create-then-rename.
//!
//! # Architecture
//!
//! - [`config`] — one immutable [`UpdaterConfig`] passed to every component
//! - [`paths`] — the on-disk layout, derived purely from the runtime root
//! - [`transport`] — the `GET url → bytes` capability; reqwest in production
//! - [`cache`] — TTL-cached release metadata with stale fallback
//! - [`installer`] — staged download + extraction into `extracted.<tag>/`
//! - [`promote`] — the atomic symlink swap and guarded garbage collection
//! - [`env`] — environment variables for consumers of the active install
//! - [`updater`] — the [`Updater`] pipeline tying the stages together
//!
//! # Layout on disk
//!
//! ```text
//! <runtime_root>/
//! ├── latest.json          cached raw release document
//! ├── latest               symlink to the active install directory
//! └── extracted.<tag>/     one immutable directory per installed version
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use streamproxy_runtime::{Updater, UpdaterConfig, environment};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), streamproxy_runtime::UpdateError> {
//! let config = UpdaterConfig::new("/home/user/.local/share/app/winestreamproxy");
//! let updater = Updater::new(config)?;
//!
//! // Install (or refresh) and activate the latest release.
//! updater.install().await?;
//!
//! // Hand the discovery variables to the process being launched.
//! for (name, value) in environment(Path::new("/run/user/1000")) {
//!     println!("{name}={}", value.to_string_lossy());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod installer;
pub mod paths;
pub mod promote;
pub mod release;
pub mod transport;
pub mod updater;
pub mod utils;

// Fixtures shared between unit and integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::MetadataCache;
pub use config::UpdaterConfig;
pub use env::{environment, environment_with_pipe};
pub use error::{Result, UpdateError};
pub use installer::Installer;
pub use paths::RuntimePaths;
pub use promote::promote;
pub use release::{Release, ReleaseAsset};
pub use transport::{HttpTransport, Transport};
pub use updater::Updater;
