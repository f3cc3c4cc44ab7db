//! CLI integration tests using assert_cmd.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn zetatrack() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("zetatrack").unwrap()
}

#[test]
fn stats_summarises_history() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("scores.txt");
    fs::write(
        &scores,
        "1700000000 120 3 + 4 900 10 - 3 -1\n1700000100 120 6 * 7 1100 8 / 2 -1\n",
    )
    .unwrap();

    zetatrack()
        .arg("stats")
        .arg("--scores")
        .arg(&scores)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions: 2"))
        .stdout(predicate::str::contains("Best score: 1"))
        .stdout(predicate::str::contains("Median: 1000 ms"))
        .stdout(predicate::str::contains("STDev: 141 ms"));
}

#[test]
fn stats_with_one_sample_reports_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("scores.txt");
    fs::write(&scores, "1700000000 120 3 + 4 900 10 - 3 -1\n").unwrap();

    zetatrack()
        .args(["stats", "--scores"])
        .arg(&scores)
        .assert()
        .success()
        .stdout(predicate::str::contains("Median: 900 ms"))
        .stdout(predicate::str::contains("IQR: insufficient data"));
}

#[test]
fn stats_on_corrupt_history_fails() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("scores.txt");
    fs::write(&scores, "not a record\n").unwrap();

    zetatrack()
        .args(["stats", "--scores"])
        .arg(&scores)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: score history line 1"));
}

#[test]
fn config_saves_and_show_prints_it() {
    let dir = TempDir::new().unwrap();

    zetatrack()
        .args(["config", "sprint", "-d", "30", "--operations", "+-"])
        .arg("--config-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sprint.json"));
    assert!(dir.path().join("sprint.json").exists());

    zetatrack()
        .args(["show", "sprint", "--config-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"sprint\""))
        .stdout(predicate::str::contains("\"duration_secs\": 30"));
}

#[test]
fn show_without_saved_default_prints_preset() {
    let dir = TempDir::new().unwrap();
    zetatrack()
        .args(["show", "--config-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"duration_secs\": 120"))
        .stdout(predicate::str::contains("\"max_left\": 1200"));
}

#[test]
fn show_unknown_config_fails() {
    let dir = TempDir::new().unwrap();
    zetatrack()
        .args(["show", "missing", "--config-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("config `missing` does not exist"));
}

#[test]
fn invalid_config_is_rejected_with_every_violation() {
    let dir = TempDir::new().unwrap();
    zetatrack()
        .args(["config", "broken", "-d", "0", "--multiplication", "5:2,2:100"])
        .arg("--config-dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "config error: non-positive game duration (0s)",
        ))
        .stderr(predicate::str::contains(
            "config error: no possible multiplication operands",
        ));
    assert!(!dir.path().join("broken.json").exists());
}

#[test]
fn play_rejects_invalid_duration_before_touching_the_terminal() {
    let dir = TempDir::new().unwrap();
    zetatrack()
        .args(["-t", "0", "--config-dir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config error: non-positive game duration"));
}

#[test]
fn play_requires_a_tty() {
    let dir = TempDir::new().unwrap();
    zetatrack()
        .args(["play", "--config-dir"])
        .arg(dir.path())
        .arg("--scores")
        .arg(dir.path().join("scores.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin must be a tty"));
    assert!(!dir.path().join("scores.txt").exists());
}
