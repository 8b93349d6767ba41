//! Integration tests for the `aosom` CLI binary.
//!
//! Parsing, help, completions and configuration run without a server;
//! the rest talk to a wiremock AOS server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `aosom` binary with env isolation.
///
/// Clears the `AOS_*` / `AOSOM_*` variables and points config
/// directories at a nonexistent path so tests never touch a real config.
fn aosom_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("aosom");
    cmd.env("HOME", "/tmp/aosom-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/aosom-cli-test-nonexistent")
        .env_remove("AOS_SERVER")
        .env_remove("AOS_SERVER_PORT")
        .env_remove("AOS_USER")
        .env_remove("AOS_PASSWD")
        .env_remove("AOS_SESSION_TOKEN")
        .env_remove("AOSOM_PROFILE")
        .env_remove("AOSOM_OUTPUT")
        .env_remove("AOSOM_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A mock AOS server that accepts any login and reports API 2.1.0.
async fn aos_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "tok-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/versions/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "2.1.0" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/resources/ip-pools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "display_name": "pool-a", "id": "ip-1" },
                { "display_name": "pool-b", "id": "ip-2" },
            ]
        })))
        .mount(&server)
        .await;
    server
}

/// Run the binary against `server` without blocking the mock's runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let port = server.address().port().to_string();
    let mut cmd = aosom_cmd();
    cmd.args(["--server", "127.0.0.1", "--port", &port]).args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = aosom_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    aosom_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("AOS")
            .and(predicate::str::contains("resources"))
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("blueprint")),
    );
}

#[test]
fn test_version_flag() {
    aosom_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aosom"));
}

#[test]
fn test_completions_zsh() {
    aosom_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_blueprint_subcommands_exist() {
    aosom_cmd()
        .args(["blueprint", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ready")
                .and(predicate::str::contains("errors"))
                .and(predicate::str::contains("slots"))
                .and(predicate::str::contains("cabling")),
        );
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_resources_table() {
    aosom_cmd().arg("resources").assert().success().stdout(
        predicate::str::contains("IpPools")
            .and(predicate::str::contains("resources/ip-pools"))
            .and(predicate::str::contains("device_key")),
    );
}

#[test]
fn test_resources_plain() {
    let output = aosom_cmd()
        .args(["-o", "plain", "resources"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 10, "{stdout}");
    assert!(stdout.lines().any(|l| l == "RackTypes"));
}

#[test]
fn test_config_path_and_show() {
    aosom_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    // no config file: the defaults render fine
    aosom_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_use_unknown_profile() {
    aosom_cmd()
        .args(["config", "use", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_list_without_server() {
    let output = aosom_cmd().args(["list", "IpPools"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("AOS_SERVER"), "Expected server hint:\n{text}");
}

#[test]
fn test_invalid_output_format() {
    let output = aosom_cmd()
        .args(["--output", "invalid", "resources"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Against a server ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_plain_names() {
    let server = aos_server().await;
    let output = run_against(&server, &["-o", "plain", "list", "ip_pools"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pool-a\npool-b\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_missing_item_exit_code() {
    let server = aos_server().await;
    let output = run_against(&server, &["show", "IpPools", "pool-z"]).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("pool-z"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_resource_exit_code() {
    let server = aos_server().await;
    let output = run_against(&server, &["list", "Bogus"]).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_needs_yes_without_terminal() {
    let server = aos_server().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(&server, &["delete", "IpPools", "pool-a"]).await;
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes() {
    let server = aos_server().await;
    Mock::given(method("DELETE"))
        .and(path("/api/resources/ip-pools/ip-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["--yes", "delete", "IpPools", "pool-a"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blueprint_ready_times_out() {
    let server = aos_server().await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "display_name": "pod-1", "id": "bp-1" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/blueprints/bp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bp-1",
            "errors": { "nodes": { "spine1": "no asn" } }
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["blueprint", "ready", "pod-1", "--timeout-ms", "500"]).await;
    assert_eq!(output.status.code(), Some(8), "{}", combined_output(&output));
}
