//! Error handling for streamproxy-runtime.
//!
//! All fallible operations in this crate return [`UpdateError`] so that callers —
//! and in particular the stale-fallback chain in [`crate::cache`] — can react to
//! specific failure kinds instead of intercepting opaque errors. The variants map
//! onto the stages of the update pipeline:
//!
//! - [`UpdateError::Fetch`] / [`UpdateError::FetchStatus`] — the release API or
//!   archive download could not be reached or answered with a non-success status
//! - [`UpdateError::InvalidMetadata`] / [`UpdateError::NoMatchingAsset`] — the
//!   release document was malformed or carried no usable asset
//! - [`UpdateError::Extraction`] — the downloaded archive could not be unpacked
//! - [`UpdateError::Filesystem`] / [`UpdateError::Io`] — writes, renames or
//!   symlink operations failed
//!
//! Fetch and metadata errors are recoverable as long as a cached release document
//! exists; extraction and filesystem errors during an install are always fatal to
//! that install attempt.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UpdateError>;

/// The error type for all update pipeline operations.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The HTTP transport failed before a response was obtained.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// The URL that was being fetched.
        url: String,
        /// Human-readable description of the transport failure.
        reason: String,
    },

    /// The server answered, but with a non-success status code.
    #[error("server returned HTTP {status} for {url}")]
    FetchStatus {
        /// The URL that was being fetched.
        url: String,
        /// The HTTP status code of the response.
        status: u16,
    },

    /// The release document was structurally unusable.
    #[error("invalid release metadata: {reason}")]
    InvalidMetadata {
        /// What was wrong with the document.
        reason: String,
    },

    /// The release document carried no asset matching the expected name pattern.
    #[error("no release asset matches pattern `{pattern}`")]
    NoMatchingAsset {
        /// The asset name pattern that nothing matched.
        pattern: String,
    },

    /// The downloaded archive could not be unpacked.
    #[error("failed to extract release archive: {reason}")]
    Extraction {
        /// What went wrong while unpacking.
        reason: String,
    },

    /// A filesystem operation on a known path failed.
    #[error("filesystem operation failed on {path}: {source}")]
    Filesystem {
        /// The path the operation was acting on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error without a more specific path context.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The release document was not valid JSON.
    #[error("failed to parse release metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl UpdateError {
    /// Attach a path to an I/O error.
    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
