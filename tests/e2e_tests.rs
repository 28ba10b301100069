//! End-to-End Tests for the countdown CLI.
//!
//! These tests run the compiled binary and verify complete user workflows:
//! - Offline simulation from a snapshot file
//! - Argument validation
//! - Connection failure reporting
//! - Shell completions and help

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

// ============================================================================
// Test Helpers
// ============================================================================

fn countdown() -> Command {
    let mut cmd = Command::cargo_bin("countdown").expect("bin");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes a snapshot file for the simulate command.
fn snapshot_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", json).unwrap();
    file
}

// ============================================================================
// Simulate Command
// ============================================================================

#[test]
fn test_simulate_runs_to_finish() {
    let file = snapshot_file(
        r#"{"seconds":2,"total_seconds":2,"seconds_passed":0,"repeat":0,"total_repeats":3,"is_running":true}"#,
    );

    countdown()
        .arg("simulate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("* タイマーに接続しました (状態: 実行中)"))
        .stdout(predicate::str::contains("リピート: #3"))
        .stdout(predicate::str::contains("* カウントダウンが終了しました"))
        .stdout(predicate::str::contains("ティック数: 6"))
        .stdout(predicate::str::contains("状態: 終了"));
}

#[test]
fn test_simulate_with_break() {
    let file = snapshot_file(
        r#"{"seconds":3,"total_seconds":3,"seconds_passed":0,"repeat":0,"total_repeats":3,
            "breaks":[1],"break_duration":5,"is_running":true}"#,
    );

    countdown()
        .arg("simulate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("|| 長い休憩に入りました"))
        .stdout(predicate::str::contains("> 休憩が終わりました"))
        .stdout(predicate::str::contains("ティック数: 14"));
}

#[test]
fn test_simulate_tick_limit() {
    let file = snapshot_file(
        r#"{"seconds":90,"total_seconds":90,"seconds_passed":0,"repeat":0,"total_repeats":2,"is_running":true}"#,
    );

    countdown()
        .args(["simulate", "--ticks", "30"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("残り時間: 1:00"))
        .stdout(predicate::str::contains("ティック数: 30"))
        .stdout(predicate::str::contains("状態: 終了").not());
}

#[test]
fn test_simulate_paused_snapshot() {
    let file = snapshot_file(
        r#"{"seconds":10,"total_seconds":10,"seconds_passed":0,"repeat":0,"total_repeats":1,"is_running":true,"is_paused":true}"#,
    );

    countdown()
        .arg("simulate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("一時停止中"))
        .stdout(predicate::str::contains("ティック数: 0"));
}

#[test]
fn test_simulate_missing_file() {
    countdown()
        .args(["simulate", "/nonexistent/snapshot.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("エラー"));
}

#[test]
fn test_simulate_invalid_snapshot() {
    let file = snapshot_file(
        r#"{"seconds":5,"total_seconds":5,"seconds_passed":0,"repeat":4,"total_repeats":2,"is_running":true}"#,
    );

    countdown()
        .arg("simulate")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("エラー"));
}

// ============================================================================
// Watch Command
// ============================================================================

#[test]
fn test_watch_rejects_invalid_origin() {
    countdown()
        .args(["watch", "--origin", "ftp://example.com"])
        .assert()
        .failure();
}

#[test]
fn test_watch_reports_unreachable_server() {
    countdown()
        .args(["watch", "--origin", "http://127.0.0.1:1"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("接続できません"));
}

// ============================================================================
// Help and Completions
// ============================================================================

#[test]
fn test_no_args_shows_help() {
    countdown()
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn test_completions_bash() {
    countdown()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("countdown"));
}
