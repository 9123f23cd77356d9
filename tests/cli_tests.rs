//! Integration tests for the mathchat CLI
//!
//! These tests run the actual binary against a temporary data and config
//! directory and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary isolated from the user's config, data and terminal colors
fn mathchat_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mathchat").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("MATHCHAT_DATA_DIR", home.path().join("data"))
        .env("NO_COLOR", "1")
        .env_remove("MATHCHAT_THINK_DELAY_MS")
        .env_remove("COLORFGBG")
        .env_remove("RUST_LOG");
    cmd
}

fn store_json(home: &TempDir) -> serde_json::Value {
    let raw = fs::read_to_string(home.path().join("data").join("store.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("math tutor"))
        .stdout(predicate::str::contains("repl"))
        .stdout(predicate::str::contains("--data-dir"));
}

#[test]
fn test_score_starts_at_zero() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .arg("score")
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_repl_solve_and_help() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin("solve (2+3)*4\nhelp\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Hi, I am a math demo chatbot. Type `practice` to begin.",
        ))
        .stdout(predicate::str::contains("Your score: 0"))
        .stdout(predicate::str::contains("(2+3)×4 = 20"))
        .stdout(predicate::str::contains("Commands: `solve <expr>`"));
}

#[test]
fn test_repl_parse_failure_is_a_reply_not_an_error() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin("solve 2 +* nope\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("I couldn't parse that expression"));
}

#[test]
fn test_practice_give_up_leaves_score() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin("practice\ngive up\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Practice problem: "))
        .stdout(predicate::str::contains("Reply with your answer"))
        .stdout(predicate::str::contains("Answer: "));

    mathchat_cmd(&home)
        .arg("score")
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_give_up_without_problem_falls_through() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin("give up\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("I can help with simple math"));
}

#[test]
fn test_score_persists_across_runs() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("store.json"), r#"{"score": "41"}"#).unwrap();

    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin(":quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Your score: 41"));

    mathchat_cmd(&home)
        .arg("score")
        .assert()
        .success()
        .stdout("41\n");
}

#[test]
fn test_theme_defaults_to_light_without_hint() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .arg("theme")
        .assert()
        .success()
        .stdout("light\n");
}

#[test]
fn test_theme_follows_terminal_background() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .env("COLORFGBG", "15;0")
        .arg("theme")
        .assert()
        .success()
        .stdout("dark\n");
}

#[test]
fn test_theme_toggle_persists() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["theme", "toggle"])
        .assert()
        .success()
        .stdout("dark\n");
    assert_eq!(store_json(&home)["theme"], "dark");

    mathchat_cmd(&home)
        .args(["theme", "toggle"])
        .assert()
        .success()
        .stdout("light\n");
    assert_eq!(store_json(&home)["theme"], "light");
}

#[test]
fn test_repl_theme_command() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["theme", "dark"])
        .assert()
        .success();

    mathchat_cmd(&home)
        .args(["repl", "--no-delay"])
        .write_stdin(":theme\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Theme: light"));
}

#[test]
fn test_invalid_theme_argument() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["theme", "sepia"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sepia"));
}

#[test]
fn test_ephemeral_does_not_write_store() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["--ephemeral", "theme", "dark"])
        .assert()
        .success();
    assert!(!home.path().join("data").join("store.json").exists());
}

#[test]
fn test_data_dir_flag_overrides_env() {
    let home = TempDir::new().unwrap();
    let custom = home.path().join("custom");
    mathchat_cmd(&home)
        .args(["--data-dir", custom.to_str().unwrap(), "theme", "dark"])
        .assert()
        .success();
    assert!(custom.join("store.json").exists());
}

#[test]
fn test_corrupted_store_reports_fix() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("store.json"), "{not json").unwrap();

    mathchat_cmd(&home)
        .arg("score")
        .assert()
        .failure()
        .stderr(predicate::str::contains("[MC-012]"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_malformed_config_reports_fix() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("config").join("mathchat");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "think_delay_ms = [").unwrap();

    mathchat_cmd(&home)
        .arg("score")
        .assert()
        .failure()
        .stderr(predicate::str::contains("[MC-002]"));
}

#[test]
fn test_config_init_writes_defaults() {
    let home = TempDir::new().unwrap();
    mathchat_cmd(&home)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created:"))
        .stdout(predicate::str::contains("think_delay_ms    = 300"));

    let written = home
        .path()
        .join("config")
        .join("mathchat")
        .join("config.toml");
    assert!(written.exists());
}
