//! End-to-end tests of the credential-precheck binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::mocks::{MockServer, GOOD_KEY};

fn precheck() -> Command {
    let mut cmd = Command::cargo_bin("credential-precheck").unwrap();
    cmd.env_remove("ANTHROPIC_API_KEY")
        .env_remove("GITHUB_USERNAME")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn stored(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn write_config(dir: &TempDir, base_url: &str) -> std::path::PathBuf {
    let path = dir.path().join("precheck.toml");
    fs::write(
        &path,
        format!(
            "timeout_ms = 5000\n\n[anthropic]\nbase_url = \"{0}\"\n\n[github]\nbase_url = \"{0}\"\n",
            base_url
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_version_command() {
    precheck()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("credential-precheck"));
}

#[test]
fn test_statuses_lists_every_code() {
    precheck()
        .arg("statuses")
        .assert()
        .success()
        .stdout(predicate::str::contains("ANTHROPIC_API_KEY_NOT_SET"))
        .stdout(predicate::str::contains("GITHUB_USERNAME_INCORRECT"))
        .stdout(predicate::str::contains("GITHUB_VALID"));
}

#[test]
fn test_run_without_round_is_usage_error() {
    precheck().arg("run").assert().code(3);
}

#[test]
fn test_run_without_key_persists_rejection() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");

    precheck()
        .args(["run", "--round", "7", "--store"])
        .arg(&store)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Anthropic API key is not set"));

    assert_eq!(stored(&store)["result-7"], "Anthropic API key is not set");
}

#[test]
fn test_run_with_malformed_key_needs_no_network() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");
    // Nothing listens on the configured endpoints
    let config = write_config(&dir, "http://127.0.0.1:9");

    precheck()
        .env("ANTHROPIC_API_KEY", "sk-ant-too-short")
        .args(["run", "--round", "2", "--config"])
        .arg(&config)
        .arg("--store")
        .arg(&store)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Anthropic API key is invalid"));

    assert_eq!(stored(&store)["result-2"], "Anthropic API key is invalid");
}

#[test]
fn test_run_keeps_results_of_other_rounds() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");

    for round in ["1", "2"] {
        precheck()
            .args(["run", "--round", round, "--store"])
            .arg(&store)
            .assert()
            .code(1);
    }

    let results = stored(&store);
    assert_eq!(results["result-1"], "Anthropic API key is not set");
    assert_eq!(results["result-2"], "Anthropic API key is not set");
}

#[test]
fn test_run_json_rejection() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");

    let output = precheck()
        .args(["--format", "json", "run", "--round", "4", "--store"])
        .arg(&store)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["round"], "4");
    assert_eq!(value["valid"], false);
    assert_eq!(value["status"], "ANTHROPIC_API_KEY_NOT_SET");
    assert_eq!(value["action"], "Set up credentials");
}

#[test]
fn test_run_passes_against_local_apis() {
    let server = MockServer::start(4, |request| match request.target.as_str() {
        "/v1/messages" => (200, "{}".to_string()),
        "/users/alice" => (200, "{}".to_string()),
        "/user" => (200, r#"{"login": "alice"}"#.to_string()),
        _ => (404, "{}".to_string()),
    });
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("results.json");
    let config = write_config(&dir, &server.base_url());

    precheck()
        .env("ANTHROPIC_API_KEY", GOOD_KEY)
        .env("GITHUB_USERNAME", "alice")
        .env("GITHUB_TOKEN", "tok")
        .args(["run", "--round", "9", "--config"])
        .arg(&config)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("[PASS]"));

    assert!(!store.exists());
}

#[test]
fn test_check_reports_every_credential() {
    let output = precheck()
        .args(["--format", "json", "check"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let text = value.to_string();
    assert!(text.contains("ANTHROPIC_API_KEY_NOT_SET"));
    assert!(text.contains("GITHUB_USERNAME_NOT_SET"));
}

#[test]
fn test_invalid_config_is_runtime_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("precheck.toml");
    fs::write(&config, "timeout_ms = 0\n").unwrap();

    precheck()
        .args(["check", "--config"])
        .arg(&config)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_config_is_runtime_error() {
    precheck()
        .args(["check", "--config", "/nonexistent/precheck.toml"])
        .assert()
        .code(3);
}
