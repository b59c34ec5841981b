//! Integration tests for the linemark CLI.
//!
//! These tests run the binary against real git repositories.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(status.status.success(), "git {args:?} failed");
}

/// Helper to create a git repository with one commit on `main`.
fn setup_git_repo() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");

    git(temp.path(), &["init"]);
    git(temp.path(), &["config", "user.email", "test@example.com"]);
    git(temp.path(), &["config", "user.name", "Test User"]);

    fs::write(temp.path().join("README.md"), "# Test Repo\n").expect("Failed to write README");
    git(temp.path(), &["add", "."]);
    git(temp.path(), &["commit", "-m", "Initial commit"]);
    git(temp.path(), &["branch", "-M", "main"]);

    temp
}

/// Helper to get linemark command with an isolated config directory.
fn linemark(config_home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_linemark"));
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("LINEMARK_LOG");
    cmd
}

/// Helper to install a shell script as the backend program.
///
/// The script runs `prelude` and then hands every invocation to git.
#[cfg(unix)]
fn fixture_backend(dir: &Path, prelude: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("backend.sh");
    fs::write(&script, format!("#!/bin/sh\n{prelude}\nexec git \"$@\"\n")).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Helper to write a config file selecting `program` as the backend.
fn write_config(dir: &Path, program: &Path) -> PathBuf {
    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!("[backend]\nprogram = {:?}\n", program.to_str().unwrap()),
    )
    .unwrap();
    config
}

fn head_commit(dir: &Path) -> String {
    let output = StdCommand::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    linemark(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("linemark"));
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    linemark(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("blame"))
        .stdout(predicate::str::contains("moved"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    linemark(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linemark"));
}

#[test]
fn test_backend_version() {
    let home = TempDir::new().unwrap();
    linemark(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^git \d+\.\d+\.\d+").unwrap());
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    fs::write(&config, "[backend\n").unwrap();

    linemark(&home)
        .args(["--config", config.to_str().unwrap(), "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_configured_backend_program_is_used() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("linemark").join("config.toml");
    fs::create_dir_all(config.parent().unwrap()).unwrap();
    fs::write(&config, "[backend]\nprogram = \"linemark-no-such-vcs\"\n").unwrap();

    linemark(&home)
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("linemark-no-such-vcs"));
}

// ============================================================================
// Repository tests
// ============================================================================

#[test]
fn test_status_outside_repository() {
    let home = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();

    linemark(&home)
        .arg("status")
        .current_dir(&temp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not inside a repository"));
}

#[test]
fn test_status_json() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("README.md"), "# Changed\n").unwrap();
    fs::write(temp.path().join("untracked.txt"), "new\n").unwrap();

    let output = linemark(&home)
        .args(["status", "--json"])
        .current_dir(&temp)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["branch"], "main");
    assert_eq!(json["detached"], false);
    assert_eq!(json["modified"], serde_json::json!(["README.md"]));
}

#[test]
fn test_status_path_with_spaces() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("my notes.txt"), "draft\n").unwrap();
    git(temp.path(), &["add", "."]);
    git(temp.path(), &["commit", "-m", "Add notes"]);
    fs::write(temp.path().join("my notes.txt"), "final\n").unwrap();

    let output = linemark(&home)
        .args(["status", "--json"])
        .current_dir(&temp)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["modified"], serde_json::json!(["my notes.txt"]));
}

#[cfg(unix)]
#[test]
fn test_status_resolves_with_detected_backend_version() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    let log = home.path().join("calls.log");

    let backend = fixture_backend(
        home.path(),
        &format!("echo \"$*\" >> '{}'", log.display()),
    );
    let config = write_config(home.path(), &backend);

    linemark(&home)
        .args(["--config", config.to_str().unwrap(), "status"])
        .current_dir(&temp)
        .assert()
        .success();

    let calls = fs::read_to_string(&log).unwrap();
    assert!(calls.lines().next().unwrap().starts_with("--version"));
    assert!(calls.contains("rev-parse --show-toplevel --absolute-git-dir"));
}

#[cfg(unix)]
#[test]
fn test_status_old_backend_uses_git_dir() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    let log = home.path().join("calls.log");

    let backend = fixture_backend(
        home.path(),
        &format!(
            "echo \"$*\" >> '{}'\nif [ \"$1\" = --version ]; then echo 'git version 2.9.0'; exit 0; fi",
            log.display()
        ),
    );
    let config = write_config(home.path(), &backend);

    let output = linemark(&home)
        .args(["--config", config.to_str().unwrap(), "status", "--json"])
        .current_dir(&temp)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["branch"], "main");
    assert_eq!(json["detached"], false);

    let calls = fs::read_to_string(&log).unwrap();
    assert!(calls.contains("rev-parse --show-toplevel --git-dir"));
    assert!(!calls.contains("--absolute-git-dir"));
}

#[test]
fn test_status_no_commits() {
    let home = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();
    git(temp.path(), &["init"]);

    linemark(&home)
        .arg("status")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no commits yet)"));
}

#[test]
fn test_show_head() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("README.md"), "# Changed\n").unwrap();

    linemark(&home)
        .args(["show", "README.md"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout("# Test Repo\n");
}

#[test]
fn test_show_index() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("README.md"), "# Staged\n").unwrap();
    git(temp.path(), &["add", "README.md"]);
    fs::write(temp.path().join("README.md"), "# Unstaged\n").unwrap();

    linemark(&home)
        .args(["show", "README.md", "--rev", ":0"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout("# Staged\n");
}

#[test]
fn test_show_latin1_content() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("legacy.txt"), b"caf\xE9\n").unwrap();
    git(temp.path(), &["add", "legacy.txt"]);
    git(temp.path(), &["commit", "-m", "Add legacy file"]);

    linemark(&home)
        .args(["show", "legacy.txt", "--encoding", "latin1"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout("café\n");
}

#[test]
fn test_show_missing_revision_warns() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("new.txt"), "new\n").unwrap();

    linemark(&home)
        .args(["show", "new.txt"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("new.txt"));
}

#[test]
fn test_blame_untracked_file_is_uncommitted() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::write(temp.path().join("new.txt"), "new\n").unwrap();

    linemark(&home)
        .args(["blame", "new.txt", "1", "--json"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not Committed Yet"))
        .stdout(predicate::str::contains("\"commit_id\": null"));
}

#[test]
fn test_blame_rejects_line_zero() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();

    linemark(&home)
        .args(["blame", "README.md", "0"])
        .current_dir(&temp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line numbers start at 1"));
}

#[test]
fn test_blame_surfaces_backend_errors() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();

    // Stock git has no structured blame output.
    linemark(&home)
        .args(["blame", "README.md", "1", "--json"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not Committed Yet"))
        .stderr(predicate::str::contains("json"));
}

#[cfg(unix)]
#[test]
fn test_blame_committed_line() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    let commit = head_commit(temp.path());

    let report = home.path().join("report.json");
    fs::write(
        &report,
        format!(
            r#"{{
  "annotations": [{{"line": 1, "original_line": 1, "commit": "{commit}", "label": "committed"}}],
  "commits": [{{
    "id": "{commit}",
    "author": "Test User",
    "email": "test@example.com",
    "date": "2023-05-01T10:00:00+02:00",
    "message": "Initial commit\n",
    "path": "README.md",
    "parents": []
  }}]
}}"#
        ),
    )
    .unwrap();

    let backend = fixture_backend(
        home.path(),
        &format!(
            "if [ \"$1\" = blame ] && [ \"$2\" = --json ]; then cat '{}'; exit 0; fi",
            report.display()
        ),
    );
    let config = write_config(home.path(), &backend);

    let output = linemark(&home)
        .args(["--config", config.to_str().unwrap(), "blame", "README.md", "1", "--json"])
        .current_dir(&temp)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["author"], "Test User");
    assert_eq!(json["author_contact"], "<test@example.com>");
    assert_eq!(json["commit_id"], commit.as_str());
    assert_eq!(json["summary"], "Initial commit");
    assert_eq!(json["author_time"], 1_682_928_000);
}

#[test]
fn test_moved_detects_staged_rename() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::create_dir(temp.path().join("docs")).unwrap();
    git(temp.path(), &["mv", "README.md", "docs/README.md"]);

    linemark(&home)
        .args(["moved", "README.md"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/README.md"));
}

#[test]
fn test_moved_without_rename() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();

    linemark(&home)
        .args(["moved", "README.md"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("No staged rename"));
}

#[test]
fn test_body_strips_file_list() {
    let home = TempDir::new().unwrap();
    let temp = setup_git_repo();
    fs::create_dir(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src").join("feature.rs"), "fn f() {}\n").unwrap();
    git(temp.path(), &["add", "."]);
    git(temp.path(), &["commit", "-m", "Add feature\n\nWith details."]);

    linemark(&home)
        .args(["body", "README.md", "HEAD"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Add feature"))
        .stdout(predicate::str::contains("With details."))
        .stdout(predicate::str::contains("src/feature.rs").not());
}
