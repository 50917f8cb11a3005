//! CLI integration tests for record-relay.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for configuration errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the record-relay binary.
fn cmd() -> Command {
    Command::cargo_bin("record-relay").unwrap()
}

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--repeat"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("record-relay"));
}

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/relay.yaml", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "source:\n  type: redis\n  url: redis://localhost/8\n\
         target:\n  type: elasticsearch\n  host: localhost\n  index: \"\"\n"
    )
    .unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "run"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("target.index"));
}

#[test]
fn test_malformed_yaml_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source: [not a mapping").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
}

#[test]
fn test_file_to_file_transfer_runs() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("in.json");
    let target_path = dir.path().join("out.json");
    std::fs::write(
        &source_path,
        "{\n  \"uuid\": \"u1\",\n  \"origin\": \"test\"\n}\n",
    )
    .unwrap();

    let config_path = dir.path().join("relay.yaml");
    std::fs::write(
        &config_path,
        format!(
            "source:\n  type: file\n  path: {}\n\
             target:\n  type: file\n  path: {}\n",
            source_path.display(),
            target_path.display()
        ),
    )
    .unwrap();

    cmd()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "--output-json",
            "run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"records_transferred\": 1"));

    let written = std::fs::read_to_string(&target_path).unwrap();
    assert!(written.contains("\"uuid\": \"u1\""));
}
