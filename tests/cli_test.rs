//! CLI contract tests
//!
//! Runs the built binary against fixture repositories and checks output
//! formats, exit codes and the `checks` / `init` subcommands.

mod common;

use common::{exemplary_repo, repo_with};
use std::path::Path;
use std::process::Command;

fn shipready_bin() -> &'static str {
    env!("CARGO_BIN_EXE_shipready")
}

fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(shipready_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run shipready");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_scan_json_output() {
    let dir = exemplary_repo();
    let (code, stdout, _) = run(&["scan", path_arg(dir.path()), "--format", "json"]);
    assert_eq!(code, 0);

    let report: serde_json::Value = serde_json::from_str(stdout.trim()).expect("Invalid JSON");
    assert_eq!(report["productionReady"], true);
    assert!(report["score"].as_f64().unwrap() >= 95.0);
    assert!(report["results"].as_array().unwrap().len() > 50);
    assert!(report["categoryScores"]["security"].is_number());
    assert!(report["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn test_fail_on_not_ready_exit_code() {
    let dir = repo_with(&[("src/index.js", "module.exports = {};\n")]);
    let (code, _, stderr) = run(&["scan", path_arg(dir.path()), "--fail-on-not-ready", "-q"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--fail-on-not-ready"));

    // Without the flag a failing verdict is still a successful run
    let (code, stdout, _) = run(&["scan", path_arg(dir.path()), "-q"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Not production ready"));
    assert!(stdout.contains("doc-001"));
}

#[test]
fn test_output_file_and_markdown() {
    let dir = repo_with(&[("src/index.js", "module.exports = {};\n")]);
    let out = dir.path().join("report.md");
    let (code, stdout, _) = run(&[
        "scan",
        path_arg(dir.path()),
        "--format",
        "md",
        "--output",
        path_arg(&out),
    ]);
    assert_eq!(code, 0);
    assert!(stdout.trim().is_empty());
    let markdown = std::fs::read_to_string(&out).unwrap();
    assert!(markdown.starts_with("# ❌ Not production ready"));
    assert!(markdown.contains("`doc-001`"));
}

#[test]
fn test_category_and_exclude_flags() {
    let dir = exemplary_repo();
    let (code, stdout, _) = run(&[
        "scan",
        path_arg(dir.path()),
        "--format",
        "json",
        "--category",
        "documentation",
        "--exclude",
        "doc-001",
        "--sequential",
        "--no-cache",
    ]);
    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let results = report["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["category"] == "documentation"));
    assert!(results.iter().all(|r| r["checkId"] != "doc-001"));
}

#[test]
fn test_invalid_flags_rejected() {
    let (code, _, _) = run(&["scan", ".", "--format", "sarif"]);
    assert_eq!(code, 2);
    let (code, _, _) = run(&["scan", ".", "--max-concurrency", "0"]);
    assert_eq!(code, 2);
}

#[test]
fn test_checks_listing() {
    let (code, stdout, _) = run(&["checks"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().count() >= 50);
    assert!(stdout.lines().any(|l| l.starts_with("doc-001") && l.contains("blocker")));

    let (code, stdout, _) = run(&["checks", "--category", "security"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().all(|l| l.starts_with("sec-")));
}

#[test]
fn test_init_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run(&["init", path_arg(dir.path())]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Created"));
    let config = dir.path().join("shipready.toml");
    let template = std::fs::read_to_string(&config).unwrap();
    assert!(template.contains("[thresholds]"));

    std::fs::write(&config, "[run]\nparallel = false\n").unwrap();
    let (code, stdout, _) = run(&["init", path_arg(dir.path())]);
    assert_eq!(code, 0);
    assert!(stdout.contains("already exists"));
    assert_eq!(std::fs::read_to_string(&config).unwrap(), "[run]\nparallel = false\n");
}

#[test]
fn test_missing_path_fails() {
    let (code, _, stderr) = run(&["scan", "/definitely/not/a/repo"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Path does not exist"));
}
