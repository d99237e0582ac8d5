//! Integration tests for the `bootstrap_check` binary.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

fn check(root: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("bootstrap_check");
    cmd.current_dir(root)
        .env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("DATABASE_URL")
        .env_remove("BOT_DB_PATH")
        .env("COOKIES_PATH", root.join("secrets/cookies.txt"))
        .env("OUTPUT_ROOT", root.join("downloads"))
        .env("LOCK_FILE", root.join("run/bot.lock"));
    cmd
}

#[test]
fn missing_token_is_reported_as_failure() {
    let tmp = tempfile::tempdir().unwrap();

    check(tmp.path())
        .assert()
        .failure()
        .stdout(contains("TELEGRAM_BOT_TOKEN is not set"))
        .stdout(contains("will be created"));
}

#[test]
fn check_does_not_create_directories() {
    let tmp = tempfile::tempdir().unwrap();

    check(tmp.path())
        .env("TELEGRAM_BOT_TOKEN", "123456:test-token")
        .assert()
        .success()
        .stdout(contains("Cookies file not found"));

    assert!(!tmp.path().join("downloads").exists());
    assert!(!tmp.path().join("secrets").exists());
}

#[test]
fn json_report_is_redacted() {
    let tmp = tempfile::tempdir().unwrap();

    let output = check(tmp.path())
        .env("TELEGRAM_BOT_TOKEN", "123456:very-secret-token")
        .env("DATABASE_URL", "postgres://bot:hunter2@db/bot")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8_lossy(&output);
    assert!(!text.contains("very-secret-token"));
    assert!(!text.contains("hunter2"));

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["report"]["token_present"], true);
    assert_eq!(json["report"]["credential"], "missing");
    assert_eq!(json["report"]["database"]["kind"], "url");
    assert_eq!(
        json["worker_env"]["DATABASE_URL"],
        "postgresql://bot:***@db/bot"
    );
}

#[test]
fn invalid_ttl_is_reported_on_stderr() {
    let tmp = tempfile::tempdir().unwrap();

    check(tmp.path())
        .env_remove("RUST_LOG")
        .env("TELEGRAM_BOT_TOKEN", "123456:test-token")
        .env("TEMP_TTL_HOURS", "soon")
        .assert()
        .success()
        .stderr(contains("TEMP_TTL_HOURS=\"soon\""))
        .stdout(contains("ttl 24.0h"));
}
