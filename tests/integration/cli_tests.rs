//! Integration tests for the CLI binary.
//!
//! Verifies that the `pwstore` binary parses its arguments and fails cleanly
//! when configuration is missing. None of these invoke gpg: every command
//! exercised here either needs no encryption or stops before it.
//!
//! This test is registered as a [[test]] in the pwstore-cli crate
//! so that CARGO_BIN_EXE_pwstore is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `pwstore` binary.
fn pwstore_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pwstore"))
}

/// Run the binary against an isolated store and engine home.
fn run_in(store: &Path, engine_home: &Path, args: &[&str]) -> Output {
    pwstore_binary()
        .args(args)
        .env("PWSTORE_DIR", store)
        .env("GNUPGHOME", engine_home)
        .env_remove("PWSTORE_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute pwstore")
}

#[test]
fn cli_responds_to_help() {
    let output = pwstore_binary()
        .arg("--help")
        .output()
        .expect("failed to execute pwstore --help");

    assert!(
        output.status.success(),
        "pwstore --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage") && stdout.contains("update") && stdout.contains("alias"),
        "pwstore --help output should list the commands, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = pwstore_binary()
        .arg("--version")
        .output()
        .expect("failed to execute pwstore --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pwstore") && stdout.contains("0.15"),
        "pwstore --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = pwstore_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute pwstore");

    assert!(
        !output.status.success(),
        "pwstore with unknown flag should exit with non-zero status"
    );
}

#[test]
fn cli_requires_a_command() {
    let output = pwstore_binary()
        .arg("github")
        .output()
        .expect("failed to execute pwstore");
    assert!(!output.status.success());
}

#[test]
fn cli_initializes_store_on_first_use() {
    let store = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_in(store.path(), home.path(), &["git", "search"]);
    assert!(
        output.status.success(),
        "search on a fresh store should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());
    assert!(store.path().join(".git").is_dir());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Initialized a new password store"),
        "first use should warn about initialization, got: {stderr}"
    );

    // Second run: already initialized, nothing to warn about.
    let output = run_in(store.path(), home.path(), &["git", "search"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Initialized"));
}

#[test]
fn cli_history_of_empty_store_is_empty() {
    let store = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_in(store.path(), home.path(), &["-", "history", "--limit", "5"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_add_without_key_fails_and_writes_nothing() {
    let store = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_in(store.path(), home.path(), &["github", "add"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error:") && stderr.contains("PWSTORE_KEY"),
        "missing key should be reported, got: {stderr}"
    );
    assert!(!store.path().join("github.gpg").exists());
}

#[test]
fn cli_get_missing_record_fails() {
    let store = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_in(store.path(), home.path(), &["ghost", "get", "user"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ghost.gpg"),
        "missing record should be named, got: {stderr}"
    );
}

#[test]
fn cli_rejects_path_like_record_names() {
    let store = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();

    let output = run_in(store.path(), home.path(), &["../escape", "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid record name"));
}

#[test]
fn cli_without_engine_home_fails() {
    let store = tempfile::tempdir().unwrap();
    let empty_home = tempfile::tempdir().unwrap();

    let output = pwstore_binary()
        .args(["github", "list"])
        .env("PWSTORE_DIR", store.path())
        .env("HOME", empty_home.path())
        .env_remove("GNUPGHOME")
        .output()
        .expect("failed to execute pwstore");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("GNUPGHOME"));
}
