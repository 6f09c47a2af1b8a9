//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get an spcc command isolated from the user's config and cache
pub fn spcc(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("spcc"));
    cmd.env("SPCC_CONFIG", config_file(tmp))
        .env("SPCC_CACHE_PATH", cache_db(tmp))
        .env_remove("SPCC_SIGMA")
        .env_remove("SPCC_NO_CACHE")
        .env_remove("RUST_LOG");
    cmd
}

/// Config file location used by [`spcc`]; absent unless a test writes it
pub fn config_file(tmp: &TempDir) -> PathBuf {
    tmp.path().join("config.yaml")
}

/// Cache database location used by [`spcc`]
pub fn cache_db(tmp: &TempDir) -> PathBuf {
    tmp.path().join("cache").join("range_cache.db")
}

/// Run `cmd` and return its stdout
pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
