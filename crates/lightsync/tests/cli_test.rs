//! Integration tests for the `lightsync` CLI binary.
//!
//! Argument parsing, help output, shell completions and error handling run
//! without a server. The end-to-end cases stand up a wiremock server that
//! speaks the lighting server's HTTP surface.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NO_CONFIG: &str = "/tmp/lightsync-cli-test-nonexistent/config.toml";

/// Build a [`Command`] for the `lightsync` binary with env isolation.
///
/// Clears all `LIGHTSYNC_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn lightsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lightsync");
    cmd.env("HOME", "/tmp/lightsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lightsync-cli-test-nonexistent")
        .env("XDG_CACHE_HOME", "/tmp/lightsync-cli-test-nonexistent")
        .env("LIGHTSYNC_CONFIG", NO_CONFIG)
        .env_remove("LIGHTSYNC_PROFILE")
        .env_remove("LIGHTSYNC_SERVER")
        .env_remove("LIGHTSYNC_OUTPUT")
        .env_remove("LIGHTSYNC_INSECURE")
        .env_remove("LIGHTSYNC_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A wiremock server with one group of two lights and no switches.
async fn lighting_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_groups"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "name": "Tv", "lights": ["TvLamp", "TvStrip"] }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lights/get_lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "thing_name": "TvStrip", "state": false },
            { "thing_name": "TvLamp", "state": true, "brightness": 200 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lights/get_switches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/lights/z2m/get_known_things_hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(42)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/lights/z2m/meta/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "LED1623G12",
            "actions": { "state": {}, "brightness": {}, "linkquality": {} }
        })))
        .mount(&server)
        .await;

    server
}

fn base_url(server: &MockServer) -> String {
    format!("{}/lights/", server.uri())
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = lightsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    lightsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("lighting server")
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("things"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    lightsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lightsync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    lightsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    lightsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = lightsync_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_groups_without_server() {
    lightsync_cmd()
        .arg("groups")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("Configuration")
                .or(predicate::str::contains("config"))
                .or(predicate::str::contains("server")),
        );
}

#[test]
fn test_unknown_profile_exit_code() {
    let output = lightsync_cmd()
        .args(["--profile", "nowhere", "things"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nowhere"));
}

#[test]
fn test_set_requires_a_change() {
    let output = lightsync_cmd().args(["set", "TvLamp"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_output_format() {
    let output = lightsync_cmd()
        .args(["--output", "invalid", "things"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "Expected failure for invalid output format");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values") || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unreachable_server_is_a_connection_error() {
    let output = lightsync_cmd()
        .args(["--server", "http://127.0.0.1:9/lights/", "--timeout", "2", "--no-cache", "groups"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_ne!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` falls back to defaults when no config file exists.
    lightsync_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reconnect_delay_ms"));
}

#[test]
fn test_config_path_honors_env() {
    lightsync_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(NO_CONFIG));
}

#[test]
fn test_config_add_then_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml").display().to_string();

    lightsync_cmd()
        .env("LIGHTSYNC_CONFIG", &config)
        .args(["config", "add", "home", "--server", "http://pi.local/lights/"])
        .assert()
        .success();

    lightsync_cmd()
        .env("LIGHTSYNC_CONFIG", &config)
        .args(["--output", "plain", "config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home"));
}

#[test]
fn test_subcommands_exist() {
    lightsync_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("show")
                .and(predicate::str::contains("profiles"))
                .and(predicate::str::contains("use")),
        );
    lightsync_cmd()
        .args(["group", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("on").and(predicate::str::contains("off")));
}

// ── Against a server ────────────────────────────────────────────────

#[tokio::test]
async fn test_groups_plain_lists_members_in_order() {
    let server = lighting_server().await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "--output", "plain", "groups"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "Tv\tTvLamp\nTv\tTvStrip");
}

#[tokio::test]
async fn test_things_filtered_by_state() {
    let server = lighting_server().await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "-o", "plain", "things", "--on"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim_end(), "TvLamp");
}

#[tokio::test]
async fn test_meta_keeps_only_whitelisted_actions() {
    let server = lighting_server().await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "-o", "json", "meta", "TvLamp"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let meta: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(meta["model"], "LED1623G12");
    assert!(meta["actions"].get("brightness").is_some());
    assert!(meta["actions"].get("linkquality").is_none());
}

#[tokio::test]
async fn test_set_brightness_sends_only_brightness() {
    let server = lighting_server().await;
    Mock::given(method("PUT"))
        .and(path("/lights/z2m/set/TvLamp"))
        .and(body_json(json!({ "brightness": 40 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "set", "TvLamp", "--brightness", "40"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_set_unknown_thing_is_not_found() {
    let server = lighting_server().await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "set", "Ghost", "--on"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_group_on_hits_prefix_endpoint() {
    let server = lighting_server().await;
    Mock::given(method("PUT"))
        .and(path("/lights/all_lights_on/prefix/Tv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = lightsync_cmd();
    cmd.args(["--server", &base_url(&server), "--no-cache", "group", "Tv", "on"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_press_configured_button() {
    let server = lighting_server().await;
    Mock::given(method("PUT"))
        .and(path("/lights/scenes/movie"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            r#"
default_profile = "home"

[profiles.home]
server = "{}"
buttons = [{{ TvMovie_Mode = "scenes/movie" }}]
"#,
            base_url(&server)
        ),
    );

    let mut cmd = lightsync_cmd();
    cmd.env("LIGHTSYNC_CONFIG", &config)
        .args(["--no-cache", "press", "TvMovie_Mode"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
}
