//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "moneyminder-cli", "--"])
        .args(args)
        .env("MONEYMINDER_DATA_DIR", dir)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn json_tail(stdout: &str) -> serde_json::Value {
    let start = stdout.find(['{', '[']).expect("no JSON in output");
    serde_json::from_str(&stdout[start..]).expect("Failed to parse JSON output")
}

#[test]
fn test_notify_add_read_remove() {
    let dir = TempDir::new().unwrap();
    let added = run_ok(dir.path(), &["notify", "add", "Reminder", "Pay rent"]);
    let record = json_tail(&added);
    let id = record["id"].as_str().unwrap().to_string();
    assert_eq!(record["type"], "info");
    assert_eq!(record["read"], false);

    assert_eq!(run_ok(dir.path(), &["notify", "count"]).trim(), "1");
    assert_eq!(run_ok(dir.path(), &["notify", "read", &id]).trim(), "ok");
    assert_eq!(run_ok(dir.path(), &["notify", "count"]).trim(), "0");
    assert!(run_ok(dir.path(), &["notify", "read", &id]).contains("no change"));

    run_ok(dir.path(), &["notify", "remove", &id]);
    let listed = json_tail(&run_ok(dir.path(), &["notify", "list", "--json"]));
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[test]
fn test_notify_list_is_most_recent_first() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["notify", "add", "first", "a"]);
    run_ok(dir.path(), &["notify", "add", "second", "b", "--type", "warning"]);

    let listed = json_tail(&run_ok(dir.path(), &["notify", "list", "--json"]));
    let titles: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["second", "first"]);

    assert!(run_ok(dir.path(), &["notify", "read-all"]).contains("2 marked read"));
    run_ok(dir.path(), &["notify", "clear"]);
    assert_eq!(run_ok(dir.path(), &["notify", "count"]).trim(), "0");
}

#[test]
fn test_notify_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["notify", "add", "t", "m", "--type", "promo"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown notification type"));
}

#[test]
fn test_prefs_set_get_reset() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["prefs", "get", "pushEnabled"]).trim(), "true");

    run_ok(dir.path(), &["prefs", "set", "quietHours.start", "21:00"]);
    assert_eq!(run_ok(dir.path(), &["prefs", "get", "quietHours.start"]).trim(), "21:00");
    assert!(dir.path().join("notification_preferences.json").exists());

    run_ok(dir.path(), &["prefs", "reset"]);
    assert_eq!(run_ok(dir.path(), &["prefs", "get", "quietHours.start"]).trim(), "22:00");

    let (_, _, code) = run_cli(dir.path(), &["prefs", "get", "noSuchKey"]);
    assert_ne!(code, 0);
}

#[test]
fn test_quiet_check() {
    let dir = TempDir::new().unwrap();
    assert!(run_ok(dir.path(), &["quiet", "check", "--at", "23:00"]).contains("disabled"));

    run_ok(dir.path(), &["prefs", "set", "quietHours.enabled", "true"]);
    assert!(run_ok(dir.path(), &["quiet", "check", "--at", "23:00"]).starts_with("quiet"));
    assert!(run_ok(dir.path(), &["quiet", "check", "--at", "09:00"]).starts_with("not quiet"));
}

#[test]
fn test_remind_past_date_is_clamped_and_fires() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(
        dir.path(),
        &["remind", "schedule", "Debt due", "Pay Alex", "2001-01-01", "--data", r#"{"debtId":"d-1"}"#],
    );
    let scheduled = json_tail(&out);
    assert_eq!(scheduled["adjustment"], "past");
    assert!(scheduled["delaySecs"].as_u64().unwrap() <= 60);
    let id = scheduled["id"].as_str().unwrap().to_string();

    let pending = json_tail(&run_ok(dir.path(), &["remind", "list"]));
    assert_eq!(pending[0]["data"]["debtId"], "d-1");
    assert!(pending[0]["data"]["scheduledFor"].is_string());

    // Deliver 30 minutes late: one drift warning plus the reminder itself.
    let late = (chrono::Utc::now() + chrono::Duration::minutes(30)).to_rfc3339();
    let fired = run_ok(dir.path(), &["remind", "fire", &id, "--at", &late]);
    assert!(fired.contains("drift warning issued"));

    let listed = json_tail(&run_ok(dir.path(), &["notify", "list", "--json"]));
    let records = listed.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "warning");
    assert_eq!(records[1]["title"], "Debt due");

    let pending = json_tail(&run_ok(dir.path(), &["remind", "list"]));
    assert_eq!(pending.as_array().unwrap().len(), 0);
}

#[test]
fn test_remind_unparseable_date_still_schedules() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["remind", "schedule", "t", "b", "whenever"]);
    let scheduled = json_tail(&out);
    assert_eq!(scheduled["adjustment"], "unparseable");
    assert_eq!(scheduled["delaySecs"], 60);
}

#[test]
fn test_remind_cancel_and_disabled() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["remind", "schedule", "t", "b", "2099-01-01"]);
    let id = json_tail(&out)["id"].as_str().unwrap().to_string();

    run_ok(dir.path(), &["remind", "cancel", &id]);
    run_ok(dir.path(), &["remind", "cancel", "unknown-id"]);
    let pending = json_tail(&run_ok(dir.path(), &["remind", "list"]));
    assert_eq!(pending.as_array().unwrap().len(), 0);

    run_ok(dir.path(), &["prefs", "set", "remindersEnabled", "false"]);
    let (_, stderr, code) = run_cli(dir.path(), &["remind", "schedule", "t", "b", "2099-01-01"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Reminders are disabled"));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "scheduler.min_delay_secs"]).trim(), "5");
    run_ok(dir.path(), &["config", "set", "scheduler.fallback_delay_secs", "120"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "scheduler.fallback_delay_secs"]).trim(),
        "120"
    );

    let out = run_ok(dir.path(), &["remind", "schedule", "t", "b", "garbage"]);
    assert_eq!(json_tail(&out)["delaySecs"], 120);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "scheduler.nope", "1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_rejects_oversized_delays() {
    let dir = TempDir::new().unwrap();
    for key in [
        "scheduler.drift_threshold_secs",
        "scheduler.fallback_delay_secs",
        "scheduler.min_delay_secs",
    ] {
        let (_, stderr, code) = run_cli(dir.path(), &["config", "set", key, "10000000000000000"]);
        assert_ne!(code, 0, "{key} accepted an oversized value");
        assert!(stderr.contains("exceeds the maximum"));
    }

    run_ok(dir.path(), &["notify", "list"]);
    let out = run_ok(dir.path(), &["remind", "schedule", "t", "b", "garbage"]);
    assert_eq!(json_tail(&out)["delaySecs"], 60);
}
