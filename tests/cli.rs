//! Offline CLI behavior: configuration errors and check selection, which
//! resolve before any network traffic.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("drip-doctor").unwrap();
    cmd.env_remove("DRIP_API_KEY")
        .env_remove("DRIP_API_URL")
        .env_remove("TEST_CUSTOMER_ID")
        .env_remove("SKIP_CLEANUP")
        .env_remove("CHECK_TIMEOUT");
    cmd
}

#[test]
fn missing_api_key_is_a_config_error() {
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("DRIP_API_KEY"));
}

#[test]
fn empty_api_key_is_a_config_error() {
    cmd().env("DRIP_API_KEY", "  ").assert().code(2);
}

#[test]
fn only_with_no_match_is_a_config_error() {
    cmd()
        .env("DRIP_API_KEY", "test_key")
        .args(["--only", "zzz_not_a_check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No matching checks found"));
}

#[test]
fn bad_check_timeout_is_a_config_error() {
    cmd()
        .env("DRIP_API_KEY", "test_key")
        .env("CHECK_TIMEOUT", "soon")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("CHECK_TIMEOUT"));
}

#[test]
fn help_lists_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--only"))
        .stdout(predicate::str::contains("--quick"))
        .stdout(predicate::str::contains("--no-cleanup"));
}
