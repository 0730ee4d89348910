//! End-to-end tests driving the `ct` binary.
//!
//! Each test points `HOME` at a fresh temp dir so the identity file, config
//! and database all live in isolation.

use std::path::Path;
use std::process::{Command, Output};

use chrono::{Duration, Local};
use serde_json::Value;
use tempfile::TempDir;

fn ct_binary() -> String {
    env!("CARGO_BIN_EXE_ct").to_string()
}

/// A `ct` command isolated to `home`.
fn ct(home: &Path) -> Command {
    let mut command = Command::new(ct_binary());
    command
        .env("HOME", home)
        .env_remove("XDG_DATA_HOME")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("CT_USER_ID")
        .env_remove("CT_DATABASE_PATH")
        .env_remove("RUST_LOG");
    command
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let output = ct(home).args(args).output().expect("failed to run ct");
    assert!(
        output.status.success(),
        "ct {} should succeed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    serde_json::from_str(&run_ok(home, args)).expect("output should be JSON")
}

fn run_err(home: &Path, args: &[&str]) -> Output {
    let output = ct(home).args(args).output().expect("failed to run ct");
    assert!(
        !output.status.success(),
        "ct {} should fail",
        args.join(" ")
    );
    output
}

fn days_ago(days: i64) -> String {
    (Local::now().date_naive() - Duration::days(days)).to_string()
}

#[test]
fn init_creates_identity_once() {
    let temp = TempDir::new().unwrap();
    let first = run_ok(temp.path(), &["init", "--name", "Ada"]);
    assert!(first.contains("Created user identity."));

    let identity_path = temp.path().join(".local/share/ct/user.json");
    let identity: Value =
        serde_json::from_str(&std::fs::read_to_string(&identity_path).unwrap()).unwrap();
    let user_id = identity["user_id"].as_str().unwrap().to_string();
    assert!(first.contains(&user_id));

    let second = run_ok(temp.path(), &["init"]);
    assert!(!second.contains("Created user identity."));
    assert!(second.contains(&user_id));

    let profile = run_ok(temp.path(), &["profile", "show"]);
    assert!(profile.contains("Name:          Ada"));
    assert!(profile.contains("Cycle length:  28 days"));
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();
    let output = run_err(temp.path(), &["home"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Run 'ct init' first"), "stderr: {stderr}");
}

#[test]
fn logged_history_drives_home_stats_and_calendar() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    run_ok(home, &["init"]);

    run_ok(home, &["log", "period", "--start", "30 days ago", "--length", "5"]);
    let logged = run_ok(home, &["log", "period", "--start", "2 days ago"]);
    assert!(logged.starts_with("Logged period 2"));
    run_ok(
        home,
        &["log", "symptom", "--type", "cramps", "--type", "fatigue", "--intensity", "severe"],
    );
    run_ok(
        home,
        &["log", "mood", "--type", "irritable", "--intensity", "moderate", "--date", "yesterday"],
    );

    let summary = run_json(home, &["home", "--json"]);
    assert_eq!(summary["phase"], "menstrual");
    assert_eq!(summary["cycle_day"], 3);
    assert_eq!(summary["days_until_next_period"], 26);
    assert_eq!(summary["next_period_date"], days_ago(-26));

    let stats = run_json(home, &["stats", "--json"]);
    assert_eq!(stats["average_cycle_length"], 28);
    assert_eq!(stats["average_period_length"], 5);
    assert_eq!(stats["cycle_length_trend"][0]["label"], "Cycle 1");
    assert_eq!(stats["top_symptoms"][0]["label"], "Cramps");
    assert_eq!(stats["top_symptoms"][0]["count"], 1);
    assert_eq!(stats["moods_logged"], 1);

    let marks = run_json(home, &["calendar", "--json"]);
    let today = marks[days_ago(0).as_str()].clone();
    assert_eq!(today["periods"], true);
    assert_eq!(today["symptoms"], true);
    assert_eq!(today["selected"], true);
    assert_eq!(today["selected_color"], "#FF6B8140");
    assert_eq!(marks[days_ago(1).as_str()]["moods"], true);
    assert_eq!(marks[days_ago(26).as_str()]["periods"], true);
    assert!(marks.get(days_ago(25).as_str()).is_none());

    let day = run_json(home, &["day", "--json"]);
    assert_eq!(day["is_period"], true);
    assert_eq!(day["is_fertile"], false);
    assert_eq!(day["symptoms"].as_array().unwrap().len(), 2);

    let grid = run_ok(home, &["calendar"]);
    assert!(grid.contains("* period  + other entries  > selected"));
}

#[test]
fn period_end_updates_length_and_export_includes_everything() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    run_ok(home, &["init"]);

    run_ok(home, &["log", "period", "--start", "4 days ago"]);
    let ended = run_ok(home, &["log", "period-end", "--id", "1", "--end", "yesterday"]);
    assert!(ended.contains("(4 days)"), "output: {ended}");

    run_ok(
        home,
        &[
            "log",
            "medication",
            "--name",
            "Iron",
            "--dosage",
            "1 tablet",
            "--recurring-day",
            "monday",
        ],
    );
    run_ok(home, &["log", "medication-taken", "--id", "1"]);

    let export = run_json(home, &["export"]);
    assert_eq!(export["cycles"][0]["period_length"], 4);
    assert_eq!(export["cycles"][0]["end_date"], days_ago(1));
    assert_eq!(export["medications"][0]["taken"], true);
    assert_eq!(export["medications"][0]["recurring_days"][0], "monday");
    assert!(export["exported_at"].as_str().is_some());

    run_ok(home, &["log", "period-delete", "--id", "1"]);
    let export = run_json(home, &["export"]);
    assert!(export["cycles"].as_array().unwrap().is_empty());
}

#[test]
fn unknown_symptom_is_rejected() {
    let temp = TempDir::new().unwrap();
    run_ok(temp.path(), &["init"]);

    let output = run_err(
        temp.path(),
        &["log", "symptom", "--type", "sneezing", "--intensity", "light"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected one of: cramps"), "stderr: {stderr}");
}

#[test]
fn configured_user_id_overrides_identity_file() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    run_ok(home, &["init"]);
    run_ok(home, &["log", "period", "--start", "today"]);

    let output = ct(home)
        .env("CT_USER_ID", "someone-else")
        .args(["home", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(summary["phase"].is_null());
    assert_eq!(summary["cycle_average_length"], 28);
}

#[test]
fn verbose_logs_go_to_stderr() {
    let temp = TempDir::new().unwrap();
    run_ok(temp.path(), &["init"]);

    let output = ct(temp.path())
        .args(["--verbose", "home", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice::<Value>(&output.stdout).expect("stdout stays machine readable");
    assert!(String::from_utf8_lossy(&output.stderr).contains("loaded configuration"));
}

#[test]
fn implausible_lengths_are_refused_and_home_keeps_working() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    run_ok(home, &["init"]);
    run_ok(home, &["log", "period", "--start", "2 days ago"]);

    run_err(home, &["profile", "set", "--cycle-length", "4000000000"]);
    run_err(home, &["log", "period", "--start", "today", "--length", "4000000000"]);
    run_err(home, &["log", "period-end", "--id", "1", "--end", "3 days ago"]);

    let summary = run_json(home, &["home", "--json"]);
    assert_eq!(summary["cycle_day"], 3);
    assert_eq!(summary["cycle_average_length"], 28);

    let day = run_json(home, &["day", "2 days ago", "--json"]);
    assert_eq!(day["is_period"], true);
}
