// ABOUTME: Integration tests for the shipyard CLI.
// ABOUTME: Runs the binary against temporary projects with shell collaborators.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn shipyard_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("shipyard"))
}

fn project(config: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shipyard.yml"), config).unwrap();
    dir
}

const SUCCESSFUL: &str = r#"
service: web
repo: acme/web
environments: [staging]
deploy:
  command: echo deploying; echo https://web.example.com
  token: literal-token
"#;

#[test]
fn help_shows_run_command() {
    shipyard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"));
}

#[test]
fn run_requires_revision() {
    shipyard_cmd()
        .args(["run", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--revision"));
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    shipyard_cmd()
        .current_dir(dir.path())
        .args(["run", "staging", "--revision", "abc1234"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn successful_run_records_snapshot() {
    let dir = project(SUCCESSFUL);

    shipyard_cmd()
        .current_dir(dir.path())
        .args(["--quiet", "run", "staging", "--revision", "abc1234def"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web staging success"));

    let snapshots = fs::read_dir(dir.path().join(".shipyard/rollback/staging"))
        .unwrap()
        .count();
    assert_eq!(snapshots, 1);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = project(SUCCESSFUL);

    shipyard_cmd()
        .current_dir(dir.path())
        .args(["run", "staging", "--revision", "abc1234", "--dry-run"])
        .assert()
        .success();

    assert!(!dir.path().join(".shipyard/rollback").exists());
}

#[test]
fn failing_deploy_exits_with_one() {
    let dir = project(
        r#"
service: web
repo: acme/web
environments: [staging]
deploy:
  command: exit 3
  token: literal-token
"#,
    );

    shipyard_cmd()
        .current_dir(dir.path())
        .args(["--json", "run", "staging", "--revision", "abc1234"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"success\":false"));
}
