//! Environment variables for consumers of the active installation.
//!
//! The launched helper and its Wine-side client discover each other through
//! three variables: the logical channel name, the Unix socket path derived
//! from it, and a flag marking the helper as system-managed.

use crate::config::DEFAULT_PIPE_NAME;
use std::ffi::OsString;
use std::path::Path;

/// Channel name the helper and its client agree on.
pub const PIPE_NAME_VAR: &str = "WINESTREAMPROXY_PIPE_NAME";

/// Unix socket path the helper listens on.
pub const SOCKET_PATH_VAR: &str = "WINESTREAMPROXY_SOCKET_PATH";

/// Marks the helper as managed by this crate rather than started by hand.
pub const SYSTEM_VAR: &str = "WINESTREAMPROXY_SYSTEM";

/// The environment a consumer needs, with the socket placed in `socket_dir`
/// (typically the caller's `XDG_RUNTIME_DIR`). Uses the default channel name.
pub fn environment(socket_dir: &Path) -> Vec<(&'static str, OsString)> {
    environment_with_pipe(socket_dir, DEFAULT_PIPE_NAME)
}

/// Like [`environment`], with an explicit channel name.
pub fn environment_with_pipe(socket_dir: &Path, pipe_name: &str) -> Vec<(&'static str, OsString)> {
    vec![
        (PIPE_NAME_VAR, OsString::from(pipe_name)),
        (SOCKET_PATH_VAR, socket_dir.join(pipe_name).into_os_string()),
        (SYSTEM_VAR, OsString::from("true")),
    ]
}
