//! End-to-end scenarios for the install/promote pipeline, driven through the
//! public `Updater` API with a stubbed transport.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use streamproxy_runtime::test_utils::{
    StubTransport, default_proxy_tarball, init_tracing, release_json,
};
use streamproxy_runtime::utils::fs::try_readlink;
use streamproxy_runtime::{UpdateError, Updater, UpdaterConfig};
use tempfile::TempDir;

const LATEST_URL: &str =
    "https://api.github.com/repos/openglfreak/winestreamproxy/releases/latest";

fn archive_url(tag: &str) -> String {
    format!("https://example.com/releases/{tag}/winestreamproxy.x86_64.tar.gz")
}

fn asset_name(tag: &str) -> String {
    let version = tag.trim_start_matches('v');
    format!("winestreamproxy-{version}.x86_64.tar.gz")
}

/// Register a release document and its downloadable archive on the stub.
fn publish(transport: &StubTransport, tag: &str) {
    let url = archive_url(tag);
    let name = asset_name(tag);
    transport.set_response(LATEST_URL, release_json(tag, &[(name.as_str(), url.as_str())]));
    transport.set_response(&url, default_proxy_tarball());
}

fn make_updater(root: &Path, window: Duration) -> Updater<StubTransport> {
    init_tracing();
    let config = UpdaterConfig::new(root).with_cache_window(window);
    Updater::with_transport(config, StubTransport::new())
}

fn hidden_entries(root: &Path) -> Vec<String> {
    fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with('.'))
        .collect()
}

fn active_target(root: &Path) -> Option<PathBuf> {
    try_readlink(&root.join("latest"))
}

#[tokio::test]
async fn fresh_install_activates_the_release() -> Result<()> {
    let dir = TempDir::new()?;
    let updater = make_updater(dir.path(), Duration::from_secs(86_400));
    publish(updater.transport(), "v1.2.0");

    let installed = updater.install().await?;

    assert_eq!(installed, dir.path().join("extracted.v1.2.0"));
    assert!(installed.join("winestreamproxy.exe.so").is_file());
    assert!(installed.join("wrapper.sh").is_file());

    // the active link resolves to the installed version, and resolving
    // through it reaches the executable
    assert_eq!(active_target(dir.path()), Some(installed.clone()));
    assert!(updater.proxy_exe().is_file());
    assert!(updater.wrapper_script().is_file());

    // the transient promotion link did not persist
    assert!(!dir.path().join("latest.v1.2.0").exists());

    // the raw release document was cached
    assert!(dir.path().join("latest.json").is_file());
    Ok(())
}

#[tokio::test]
async fn second_install_is_offline_and_changes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let updater = make_updater(dir.path(), Duration::from_secs(86_400));
    publish(updater.transport(), "v1.2.0");

    let first = updater.install().await?;
    let calls_after_first = updater.transport().calls();

    // even a dead network must not matter now
    updater.transport().set_status(LATEST_URL, 503);
    updater.transport().forget(&archive_url("v1.2.0"));

    let second = updater.install().await?;

    assert_eq!(second, first);
    assert_eq!(updater.transport().calls(), calls_after_first);
    assert_eq!(active_target(dir.path()), Some(first));
    Ok(())
}

#[tokio::test]
async fn upgrade_retargets_the_link_and_collects_the_old_version() -> Result<()> {
    let dir = TempDir::new()?;
    // zero cache window so the second run refetches the metadata
    let updater = make_updater(dir.path(), Duration::ZERO);
    publish(updater.transport(), "v1.2.0");
    let old = updater.install().await?;

    publish(updater.transport(), "v1.3.0");
    let new = updater.install().await?;

    assert_eq!(new, dir.path().join("extracted.v1.3.0"));
    assert_eq!(active_target(dir.path()), Some(new));
    assert!(!old.exists(), "superseded version should be collected");
    assert!(!dir.path().join("latest.v1.3.0").exists());
    Ok(())
}

#[tokio::test]
async fn stale_metadata_keeps_an_installed_version_running() -> Result<()> {
    let dir = TempDir::new()?;
    let updater = make_updater(dir.path(), Duration::ZERO);
    publish(updater.transport(), "v1.2.0");
    let installed = updater.install().await?;

    // release API down, archive gone: the stale cache must carry the day
    updater.transport().set_status(LATEST_URL, 503);
    updater.transport().forget(&archive_url("v1.2.0"));

    let again = updater.install().await?;
    assert_eq!(again, installed);
    assert_eq!(active_target(dir.path()), Some(installed));
    Ok(())
}

#[tokio::test]
async fn first_run_without_network_fails_cleanly() -> Result<()> {
    let dir = TempDir::new()?;
    let updater = make_updater(dir.path(), Duration::from_secs(86_400));
    updater.transport().set_status(LATEST_URL, 503);

    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::FetchStatus { status: 503, .. }));

    // no partial state was left behind
    assert_eq!(active_target(dir.path()), None);
    assert!(!dir.path().join("latest.json").exists());
    Ok(())
}

#[tokio::test]
async fn failed_upgrade_leaves_the_active_version_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let updater = make_updater(dir.path(), Duration::ZERO);
    publish(updater.transport(), "v1.2.0");
    let old = updater.install().await?;

    // v1.3.0 is published but its archive is corrupt
    let bad_url = archive_url("v1.3.0");
    let bad_name = asset_name("v1.3.0");
    updater.transport().set_response(
        LATEST_URL,
        release_json("v1.3.0", &[(bad_name.as_str(), bad_url.as_str())]),
    );
    updater
        .transport()
        .set_response(&bad_url, b"garbage, not a tarball".to_vec());

    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::Extraction { .. }));

    // the previously active version is still active and complete
    assert_eq!(active_target(dir.path()), Some(old.clone()));
    assert!(old.join("winestreamproxy.exe.so").is_file());

    // the failed install left neither a final directory nor staging debris
    assert!(!dir.path().join("extracted.v1.3.0").exists());
    let leftovers = hidden_entries(dir.path());
    assert!(leftovers.is_empty(), "unexpected leftovers: {leftovers:?}");
    Ok(())
}

#[tokio::test]
async fn crashed_extraction_leftovers_never_become_active() -> Result<()> {
    let dir = TempDir::new()?;

    // a previous process died after extracting but before the final rename,
    // leaving its hidden staging directory behind
    let orphan = dir.path().join(".extracted.v1.2.0.h7Kq2");
    fs::create_dir_all(&orphan)?;
    fs::write(orphan.join("winestreamproxy.exe.so"), b"half extracted")?;

    let updater = make_updater(dir.path(), Duration::from_secs(86_400));
    publish(updater.transport(), "v1.2.0");
    let installed = updater.install().await?;

    // the active link points at a complete install, not at the orphan
    assert_eq!(active_target(dir.path()), Some(installed.clone()));
    assert!(installed.join("wrapper.sh").is_file());
    assert!(orphan.exists(), "orphaned staging is left for manual cleanup");
    Ok(())
}

#[tokio::test]
async fn tampered_active_link_never_causes_outside_deletion() -> Result<()> {
    let dir = TempDir::new()?;
    let precious = TempDir::new()?;
    fs::write(precious.path().join("data"), b"do not delete")?;

    let updater = make_updater(dir.path(), Duration::ZERO);
    publish(updater.transport(), "v1.2.0");
    updater.install().await?;

    // tamper: repoint the active link outside the runtime root
    let link = dir.path().join("latest");
    fs::remove_file(&link)?;
    std::os::unix::fs::symlink(precious.path(), &link)?;

    publish(updater.transport(), "v1.3.0");
    updater.install().await?;

    assert!(precious.path().join("data").is_file());
    assert_eq!(
        active_target(dir.path()),
        Some(dir.path().join("extracted.v1.3.0"))
    );
    Ok(())
}
