//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Only the
//! pure `score` command is exercised here -- it touches neither the
//! settings file nor the network.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "deskrhythm-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_score_ideal_cycle() {
    let (stdout, _stderr, code) = run_cli(&["score", "20", "10"]);
    assert_eq!(code, 0, "score failed");
    assert!(stdout.contains("100/100"), "stdout was: {stdout}");
    assert!(stdout.contains("Points: 10"), "stdout was: {stdout}");
}

#[test]
fn test_score_short_cycle_earns_nothing() {
    let (stdout, _stderr, code) = run_cli(&["score", "5", "2"]);
    assert_eq!(code, 0, "score failed");
    assert!(stdout.contains("0/100"), "stdout was: {stdout}");
    assert!(stdout.contains("Points: 0"), "stdout was: {stdout}");
}

#[test]
fn test_score_json_output() {
    let (stdout, _stderr, code) = run_cli(&["score", "20", "10", "--json"]);
    assert_eq!(code, 0, "score --json failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert_eq!(parsed["health_score"], 100);
    assert_eq!(parsed["points"], 10);
}

#[test]
fn test_score_requires_both_durations() {
    let (_stdout, _stderr, code) = run_cli(&["score", "20"]);
    assert_ne!(code, 0);
}
