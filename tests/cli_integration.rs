//! CLI integration tests
//!
//! Tests flag handling of the script-mode binary without touching the
//! network.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("instant-domains-search").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("instant-domains-search").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("QUERY"))
        .stdout(predicate::str::contains("tlds"))
        .stdout(predicate::str::contains("no-suggestions"));
}

#[test]
fn test_missing_query_fails() {
    let mut cmd = Command::cargo_bin("instant-domains-search").unwrap();

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("query is required"));
}
