//! The HTTP capability seam.
//!
//! The update pipeline only needs one thing from the network: `GET this URL and
//! give me the body bytes`. [`Transport`] captures exactly that, so the cache
//! and installer can be driven by the reqwest-backed [`HttpTransport`] in
//! production and by an in-memory stub in tests.

use crate::error::{Result, UpdateError};
use std::future::Future;

/// A capability that fetches the body of a URL.
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Implementations must treat non-success status codes as errors; callers
    /// rely on an `Ok` meaning "these are the bytes the server published".
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Production [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with this crate's user agent.
    ///
    /// GitHub's API rejects requests without a `User-Agent` header, so one is
    /// always set.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("streamproxy-runtime/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdateError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                UpdateError::Fetch {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpdateError::FetchStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|e| UpdateError::Fetch {
                url: url.to_string(),
                reason: format!("failed to read response body: {e}"),
            })?;
            Ok(body.to_vec())
        }
    }
}
