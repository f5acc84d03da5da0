//! Basic CLI E2E tests.
//!
//! Every test runs offline: `--records` replaces the ftrack server,
//! `--dry-run` replaces Google Calendar, and `--config` points into a
//! temporary directory.

use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::TempDir;

/// Run the CLI with an isolated config file and return (stdout, stderr, code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_ftrack-calendar"))
        .current_dir(dir)
        .env("HOME", dir)
        .env("RUST_LOG", "warn")
        .env_remove("FTRACK_SERVER")
        .env_remove("FTRACK_API_USER")
        .env_remove("FTRACK_API_KEY")
        .env_remove("GOOGLE_SERVICE_AUTH")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

fn records(dir: &Path) -> String {
    write_json(
        dir,
        "records.json",
        &json!([
            {
                "__entity_type__": "Task",
                "id": "t1",
                "name": "Lighting",
                "end_date": "2020-01-01T10:00:00Z",
                "project": {"id": "show-1", "full_name": "Show", "color": "#dc2127"},
                "assignments": []
            },
            {
                "__entity_type__": "CalendarEvent",
                "id": "c1",
                "name": "Vacation",
                "start": "2020-08-03",
                "end": "2020-08-08",
                "leave": true,
                "project": {"id": "show-1", "full_name": "Show"},
                "calendar_event_resources": [{"resource": {"first_name": "Kim", "email": "kim@example.com"}}]
            }
        ]),
    )
}

#[test]
fn test_discover_prints_action() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["discover"]);

    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["items"][0]["actionIdentifier"], "make-project-events");
    assert_eq!(parsed["items"][0]["label"], "Make Calendar Events");
}

#[test]
fn test_config_init_then_get() {
    let dir = TempDir::new().unwrap();

    let (_, _, code) = run_cli(dir.path(), &["config", "init"]);
    assert_eq!(code, 0);
    assert!(dir.path().join("config.toml").exists());

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "calendar.name"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ftrack");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "calendar.nope"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);

    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_color_against_stock_palette() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["--dry-run", "color", "#dc2127"]);

    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["color_id"], "11");
}

#[test]
fn test_color_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["--dry-run", "color", "not-a-color"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("not-a-color"));
}

#[test]
fn test_ensure_calendar_dry_run() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["--dry-run", "ensure-calendar", "Renders"]);

    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["name"], "Renders");
    assert_eq!(parsed["created"], true);
    assert_eq!(parsed["warnings"][0]["step"], "share_skipped");
    assert!(stderr.contains("calendars.insert"));
}

#[test]
fn test_real_sync_requires_share_group() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["ensure-calendar"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("calendar.share_group must be set"));
}

#[test]
fn test_bulk_offline_dry_run() {
    let dir = TempDir::new().unwrap();
    let records = records(dir.path());
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["--records", &records, "--dry-run", "bulk", "show-1"],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    let entities = parsed["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["entity_id"], "c1");
    assert_eq!(entities[0]["status"], "synced");
    assert_eq!(entities[0]["color_id"], "8");
    assert_eq!(entities[1]["entity_id"], "t1");
    assert_eq!(entities[1]["color_id"], "11");
    assert!(stderr.contains("events.insert"));
}

#[test]
fn test_update_skips_foreign_types() {
    let dir = TempDir::new().unwrap();
    let records = records(dir.path());
    let notification = write_json(
        dir.path(),
        "update.json",
        &json!({"data": {"entities": [{"entityType": "note", "entityId": "n1"}]}}),
    );
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["--records", &records, "--dry-run", "update", "--file", &notification],
    );

    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["entities"][0]["status"], "skipped");
    assert!(stderr.contains("0 calendar write(s)"));
}

#[test]
fn test_launch_for_other_action_is_ignored() {
    let dir = TempDir::new().unwrap();
    let records = records(dir.path());
    let launch = write_json(
        dir.path(),
        "launch.json",
        &json!({"actionIdentifier": "someone-else", "selection": [{"entityId": "show-1"}]}),
    );
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["--records", &records, "--dry-run", "launch", "--file", &launch],
    );

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn test_launch_runs_bulk_sync() {
    let dir = TempDir::new().unwrap();
    let records = records(dir.path());
    let launch = write_json(
        dir.path(),
        "launch.json",
        &json!({"data": {
            "actionIdentifier": "make-project-events",
            "selection": [{"entityId": "show-1", "entityType": "task"}]
        }}),
    );
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["--records", &records, "--dry-run", "launch", "--file", &launch],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["entities"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_ftrack_credentials_fail() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["--dry-run", "bulk", "show-1"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("FTRACK_SERVER"));
}
