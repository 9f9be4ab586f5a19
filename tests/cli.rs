use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_help_lists_overrides() {
    cargo_bin_cmd!("uptime-monitor")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--history-size"));
}

#[test]
fn test_zero_timeout_override_is_fatal() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("uptime-monitor")
        .current_dir(dir.path())
        .args(["--timeout", "0", "--log-file"])
        .arg(dir.path().join("monitor.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout must be greater than 0"));
}

#[test]
fn test_empty_website_list_is_fatal() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "websites: []\ncheck_interval: 30\n").unwrap();

    cargo_bin_cmd!("uptime-monitor")
        .arg("--config")
        .arg(&config_path)
        .arg("--log-file")
        .arg(dir.path().join("monitor.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one URL"));
}

#[test]
fn test_missing_config_is_logged_as_fallback() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("monitor.log");

    // The fallback config is valid, so force a startup failure after loading
    // to keep the test away from the terminal.
    cargo_bin_cmd!("uptime-monitor")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .args(["--history-size", "0", "--log-file"])
        .arg(&log_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("history size must be greater than 0"));

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Using default configuration"));
    assert!(log.contains("https://www.google.com"));
}

#[test]
fn test_rejects_non_numeric_interval() {
    cargo_bin_cmd!("uptime-monitor")
        .args(["--interval", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
