//! End-to-end tests for the `fg` binary.
//!
//! These tests verify JSON output on stdout, error reports on stderr, and
//! exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CHAIN: &str = r#"{
    "id": "chain",
    "variables": [
        { "id": "a", "domain": [true, false], "marginal": [0.6, 0.4] },
        { "id": "b", "domain": [true, false] },
        { "id": "c", "domain": [true, false] }
    ],
    "edges": [
        { "id": "ab", "kind": "directed", "start": "a", "end": "b" },
        { "id": "bc", "kind": "directed", "start": "b", "end": "c" }
    ],
    "factors": [
        { "id": "p_a", "scope": ["a"], "rows": [
            { "assignment": { "a": true }, "value": 0.6 },
            { "assignment": { "a": false }, "value": 0.4 } ] },
        { "id": "p_b", "scope": ["a", "b"], "rows": [
            { "assignment": { "a": true, "b": true }, "value": 0.9 },
            { "assignment": { "a": true, "b": false }, "value": 0.1 },
            { "assignment": { "a": false, "b": true }, "value": 0.2 },
            { "assignment": { "a": false, "b": false }, "value": 0.8 } ] },
        { "id": "p_c", "scope": ["b", "c"], "rows": [
            { "assignment": { "b": true, "c": true }, "value": 0.3 },
            { "assignment": { "b": true, "c": false }, "value": 0.7 },
            { "assignment": { "b": false, "c": true }, "value": 0.5 },
            { "assignment": { "b": false, "c": false }, "value": 0.5 } ] }
    ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    /// `fg` isolated from the caller's config and log environment.
    fn fg(&self) -> Command {
        let mut cmd = Command::cargo_bin("fg").expect("fg binary should exist");
        cmd.env_remove("FG_CONFIG")
            .env_remove("FG_CONFIG_DIR")
            .env_remove("FG_LOG")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.dir.path());
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn query_prints_posterior() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    let output = ws
        .fg()
        .args(["query", "--model", arg(&model), "--query", "c", "--evidence", "a=true"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["variables"], serde_json::json!(["c"]));
    assert_eq!(json["last_eliminated"], "b");
    let rows = json["rows"].as_array().unwrap();
    let c_true = rows
        .iter()
        .find(|r| r["assignment"]["c"] == true)
        .and_then(|r| r["probability"].as_f64())
        .unwrap();
    assert!((c_true - 0.32).abs() < 1e-9);
}

#[test]
fn mpe_prints_assignment() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    let output = ws
        .fg()
        .args(["mpe", "--model", arg(&model), "-e", "c=true"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["assignment"]["a"], true);
    assert!(json["probability"].as_f64().unwrap() > 0.0);
}

#[test]
fn check_summarises_model() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    ws.fg()
        .args(["check", "--model", arg(&model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"factors\": 3"))
        .stdout(predicate::str::contains("builtin default"));
}

#[test]
fn check_flags_unnormalised_marginals() {
    let ws = Workspace::new();
    let model = ws.write(
        "loose.json",
        r#"{ "id": "loose", "variables": [ { "id": "x", "domain": [0, 1], "marginal": [0.5, 0.7] } ] }"#,
    );
    ws.fg()
        .args(["check", "--model", arg(&model)])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"x\""));
}

#[test]
fn check_honours_configured_marginal_tolerance() {
    let ws = Workspace::new();
    let model = ws.write(
        "loose.json",
        r#"{ "id": "loose", "variables": [ { "id": "x", "domain": [0, 1], "marginal": [0.5, 0.7] } ] }"#,
    );
    let config = ws.write("engine.toml", "marginal_tolerance = 0.5\n");
    ws.fg()
        .args(["--config", arg(&config), "check", "--model", arg(&model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"unnormalized_marginals\": []"));
}

#[test]
fn evidence_on_text_domain_is_read_as_text() {
    let ws = Workspace::new();
    let model = ws.write(
        "grades.json",
        r#"{
            "id": "grades",
            "variables": [
                { "id": "grade", "domain": ["1", "2"] },
                { "id": "pass", "domain": [true, false] }
            ],
            "factors": [
                { "id": "p_pass", "scope": ["grade", "pass"], "rows": [
                    { "assignment": { "grade": "1", "pass": true }, "value": 0.8 },
                    { "assignment": { "grade": "1", "pass": false }, "value": 0.2 },
                    { "assignment": { "grade": "2", "pass": true }, "value": 0.3 },
                    { "assignment": { "grade": "2", "pass": false }, "value": 0.7 } ] }
            ]
        }"#,
    );
    let output = ws
        .fg()
        .args(["query", "--model", arg(&model), "--query", "pass", "-e", "grade=1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["evidence"]["grade"], "1");
    let pass = json["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["assignment"]["pass"] == true)
        .and_then(|r| r["probability"].as_f64())
        .unwrap();
    assert!((pass - 0.8).abs() < 1e-9);
}

#[test]
fn overlapping_query_and_evidence_is_a_query_error() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    ws.fg()
        .args(["query", "--model", arg(&model), "--query", "a", "--evidence", "a=true"])
        .assert()
        .code(11)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"code\": 30"));
}

#[test]
fn impossible_evidence_is_degenerate() {
    let ws = Workspace::new();
    let model = ws.write(
        "certain.json",
        r#"{
            "id": "certain",
            "variables": [ { "id": "a", "domain": [true, false] }, { "id": "b", "domain": [true, false] } ],
            "factors": [
                { "id": "p_a", "scope": ["a"], "rows": [
                    { "assignment": { "a": true }, "value": 1.0 },
                    { "assignment": { "a": false }, "value": 0.0 } ] },
                { "id": "p_b", "scope": ["b"], "rows": [
                    { "assignment": { "b": true }, "value": 0.5 },
                    { "assignment": { "b": false }, "value": 0.5 } ] }
            ]
        }"#,
    );
    ws.fg()
        .args(["query", "--model", arg(&model), "--query", "b", "--evidence", "a=false"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("degenerate"));
}

#[test]
fn ordering_can_come_from_config() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    let config = ws.write("engine.toml", "ordering = \"min_fill\"\n");
    ws.fg()
        .args(["--config", arg(&config), "check", "--model", arg(&model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLI argument"));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let ws = Workspace::new();
    let model = ws.write("chain.json", CHAIN);
    let missing = ws.dir.path().join("nope.toml");
    ws.fg()
        .args(["--config", arg(&missing), "check", "--model", arg(&model)])
        .assert()
        .code(13);
}

#[test]
fn missing_model_file_is_an_io_error() {
    let ws = Workspace::new();
    let missing = ws.dir.path().join("missing.json");
    ws.fg()
        .args(["check", "--model", arg(&missing)])
        .assert()
        .code(20)
        .stderr(predicate::str::contains("\"category\": \"io\""));
}

#[test]
fn unknown_command_fails() {
    let ws = Workspace::new();
    ws.fg()
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
