//! The release metadata model.
//!
//! A [`Release`] is the parsed form of the JSON document the release API
//! publishes for one version: a tag plus an ordered list of downloadable
//! assets. Unknown fields in the document are ignored; GitHub sends far more
//! than this crate consumes.

use crate::error::{Result, UpdateError};
use regex::Regex;
use serde::Deserialize;

/// One published release: a version tag and its downloadable assets.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// The version tag distinguishing this release (e.g. `v2.0.3`). Tags are
    /// opaque identifiers here; the crate never orders or compares them beyond
    /// equality.
    pub tag_name: String,
    /// Downloadable assets, in the order the API listed them.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable asset of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// File name of the asset, matched against the configured pattern.
    pub name: String,
    /// Direct download URL for the asset's bytes.
    pub browser_download_url: String,
}

impl Release {
    /// Parse a raw release document.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The download URL of the first asset whose name matches `pattern`.
    pub fn download_url(&self, pattern: &Regex) -> Result<&str> {
        self.assets
            .iter()
            .find(|asset| pattern.is_match(&asset.name))
            .map(|asset| asset.browser_download_url.as_str())
            .ok_or_else(|| UpdateError::NoMatchingAsset {
                pattern: pattern.as_str().to_string(),
            })
    }

    /// Check that this release is usable: a non-empty tag and at least one
    /// asset matching `pattern`. A release failing validation must be neither
    /// installed nor cached.
    pub fn validate(&self, pattern: &Regex) -> Result<()> {
        if self.tag_name.is_empty() {
            return Err(UpdateError::InvalidMetadata {
                reason: "release has an empty tag_name".to_string(),
            });
        }
        self.download_url(pattern)?;
        Ok(())
    }
}
