//! CLI integration tests for the tessera binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the tessera binary, isolated from any ambient config.
fn tessera(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tessera").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("TESSERA_CONFIG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("HOME", dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    tessera(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = tempfile::tempdir().unwrap();
    tessera(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tessera"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulate Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_simulate_enforces_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let output = tessera(&dir)
        .args([
            "simulate",
            "--sessions",
            "20",
            "--threads",
            "2",
            "--max-sessions",
            "10",
            "--policy",
            "external",
            "--ttl-ms",
            "600000",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["requested"], 20);
    assert_eq!(report["created"], 10);
    assert_eq!(report["rejected"], 10);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["policy"], "external");
    assert_eq!(report["swept_on_clean"], 0);
    assert_eq!(report["remaining"], 10);
}

#[test]
fn test_simulate_wait_sweeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    let output = tessera(&dir)
        .args([
            "simulate",
            "--sessions",
            "50",
            "--ttl-ms",
            "10",
            "--wait",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["created"], 50);
    assert_eq!(report["swept_on_clean"], 50);
    assert_eq!(report["remaining"], 0);
}

#[test]
fn test_simulate_rejects_zero_threads() {
    let dir = tempfile::tempdir().unwrap();
    tessera(&dir)
        .args(["simulate", "--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--threads"));
}

#[test]
fn test_simulate_rejects_out_of_range_ttl() {
    let dir = tempfile::tempdir().unwrap();
    for ttl in ["9223372036854775807", "18446744073709551615"] {
        tessera(&dir)
            .args(["simulate", "--sessions", "2", "--threads", "1", "--wait", "--ttl-ms", ttl])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("out of range"))
            .stderr(predicate::str::contains("panicked").not());
    }
}

#[test]
fn test_simulate_rejects_zero_capacity() {
    let dir = tempfile::tempdir().unwrap();
    tessera(&dir)
        .args(["simulate", "--max-sessions", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_sessions"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_defaults() {
    let dir = tempfile::tempdir().unwrap();
    tessera(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(defaults)"));
}

#[test]
fn test_config_show_reads_project_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tessera.toml"),
        "[session]\nmax_sessions = 77\nsweep_policy = \"external\"\n",
    )
    .unwrap();

    tessera(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_sessions = 77"))
        .stdout(predicate::str::contains("sweep_policy = \"external\""));
}

#[test]
fn test_explicit_config_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[session]\nmax_sessions = 3\n").unwrap();

    tessera(&dir)
        .args(["--config", path.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tessera.toml"), "[session]\nmax_sessions = 0\n").unwrap();

    tessera(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}
