//! Shared fixtures for unit and integration tests.
//!
//! Compiled into the crate for unit tests, and exposed to integration tests
//! through the `test-utils` feature (the crate lists itself as a
//! dev-dependency with that feature enabled).

use crate::error::{Result, UpdateError};
use crate::transport::Transport;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

enum StubResponse {
    Bytes(Vec<u8>),
    Status(u16),
}

/// In-memory [`Transport`] with programmable per-URL responses and a call
/// counter, so tests can assert that an operation made zero network calls.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: AtomicUsize,
}

impl StubTransport {
    /// A transport that fails every request until responses are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    pub fn set_response(&self, url: &str, bytes: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), StubResponse::Bytes(bytes));
    }

    /// Answer `url` with an HTTP error status.
    pub fn set_status(&self, url: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), StubResponse::Status(status));
    }

    /// Drop any registered response for `url`; subsequent requests fail as
    /// unreachable.
    pub fn forget(&self, url: &str) {
        self.responses.lock().unwrap().remove(url);
    }

    /// Total number of `get` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for StubTransport {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.responses.lock().unwrap().get(url) {
            Some(StubResponse::Bytes(bytes)) => Ok(bytes.clone()),
            Some(StubResponse::Status(status)) => Err(UpdateError::FetchStatus {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(UpdateError::Fetch {
                url: url.to_string(),
                reason: "no stubbed response".to_string(),
            }),
        };
        async move { result }
    }
}

/// A minimal release document with the given tag and `(name, download_url)`
/// assets, shaped like the GitHub release API's response.
pub fn release_json(tag: &str, assets: &[(&str, &str)]) -> Vec<u8> {
    json!({
        "tag_name": tag,
        "assets": assets
            .iter()
            .map(|(name, url)| json!({
                "name": name,
                "browser_download_url": url,
            }))
            .collect::<Vec<_>>(),
    })
    .to_string()
    .into_bytes()
}

/// A gzip-compressed tarball containing the given `(path, contents)` files.
pub fn proxy_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(gz);
    append_files(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap()
}

/// An uncompressed tarball containing the given `(path, contents)` files.
pub fn plain_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    append_files(&mut builder, files);
    builder.into_inner().unwrap()
}

fn append_files<W: std::io::Write>(builder: &mut tar::Builder<W>, files: &[(&str, &str)]) {
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
}

/// The archive layout a real release ships: the helper executable and its
/// launch wrapper.
pub fn default_proxy_tarball() -> Vec<u8> {
    proxy_tarball(&[
        ("winestreamproxy.exe.so", "\x7fELF winestreamproxy stub"),
        ("wrapper.sh", "#!/bin/sh\nexec \"$(dirname \"$0\")/winestreamproxy.exe.so\" \"$@\"\n"),
    ])
}

/// Initialize test logging once; respects `RUST_LOG`.
#[cfg(feature = "test-utils")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
