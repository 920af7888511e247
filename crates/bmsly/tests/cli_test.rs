//! Integration tests for the `bmsly` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `bmsly` binary with env isolation.
///
/// Clears all `BMSLY_*` env vars and points config/data directories at a
/// nonexistent path so tests never touch the user's real configuration
/// or session files.
fn bmsly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("bmsly");
    cmd.env("HOME", "/tmp/bmsly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/bmsly-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/bmsly-cli-test-nonexistent")
        .env_remove("BMSLY_PROFILE")
        .env_remove("BMSLY_API_URL")
        .env_remove("BMSLY_OUTPUT")
        .env_remove("BMSLY_TIMEOUT")
        .env_remove("BMSLY_USERNAME")
        .env_remove("BMSLY_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = bmsly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    bmsly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("telemetry")
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("reports")),
    );
}

#[test]
fn test_version_flag() {
    bmsly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bmsly"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    bmsly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    bmsly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = bmsly_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_devices_list_not_logged_in() {
    // No session file exists, so the command fails closed with the auth
    // exit code before any network traffic.
    let output = bmsly_cmd().args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code 3");
    let text = combined_output(&output);
    assert!(
        text.contains("logged in") || text.contains("login"),
        "Expected a login hint:\n{text}"
    );
}

#[test]
fn test_whoami_not_logged_in() {
    let output = bmsly_cmd().arg("whoami").output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code 3");
}

#[test]
fn test_invalid_output_format() {
    let output = bmsly_cmd()
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_logs_rejects_inverted_range() {
    let output = bmsly_cmd()
        .args([
            "logs",
            "3",
            "--start",
            "2025-06-02T00:00:00Z",
            "--end",
            "2025-06-01T00:00:00Z",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("after"),
        "Expected range validation message:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse correctly — the failure should be the
    // missing session, not argument parsing.
    let output = bmsly_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--timeout",
            "60",
            "devices",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code 3");
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` uses load_config_or_default() so it succeeds even
    // when no config file exists — it just renders the default config.
    bmsly_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_prints_path() {
    bmsly_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_use_unknown_profile() {
    bmsly_cmd()
        .args(["config", "use", "nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ── End-to-end against a mock API ───────────────────────────────────

/// Unsigned JWT with `exp` in the year 2100, so the stored session
/// stays valid for the second invocation.
const FAR_FUTURE_JWT: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJleHAiOjQxMDI0NDQ4MDB9.sig";

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_devices_list_against_mock() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "access": FAR_FUTURE_JWT, "refresh": "refresh-1" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/slaves/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "slaves": [ { "slave_id": 1, "slave_name": "Meter-1" } ] }
        })))
        .mount(&server)
        .await;

    // Shared home so the session file survives between invocations.
    let home = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let mut cmd = cargo_bin_cmd!("bmsly");
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join("config"))
            .env("XDG_DATA_HOME", home.path().join("data"))
            .env("BMSLY_PASSWORD", "hunter2")
            .env("BMSLY_API_URL", server.uri())
            .args(args);
        cmd
    };

    run(&["login", "--username", "ops"]).assert().success();

    run(&["devices", "list", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Meter-1"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_devices_subcommands_exist() {
    bmsly_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list").and(predicate::str::contains("consumption")));
}

#[test]
fn test_reports_subcommands_exist() {
    bmsly_cmd()
        .args(["reports", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("date-wise").and(predicate::str::contains("month-wise")));
}

#[test]
fn test_temp_subcommands_exist() {
    bmsly_cmd()
        .args(["temp", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devices").and(predicate::str::contains("analytics")));
}

#[test]
fn test_config_subcommands_exist() {
    bmsly_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles")),
        );
}
