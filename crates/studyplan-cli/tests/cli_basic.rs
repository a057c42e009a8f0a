//! Basic CLI E2E tests.
//!
//! Tests run the built binary with HOME pointed at a temporary directory
//! so the real configuration is never touched.

use indoc::indoc;
use std::path::Path;
use std::process::Command;

const CALENDAR: &str = indoc! {"
    BEGIN:VCALENDAR
    VERSION:2.0
    BEGIN:VEVENT
    UID:lec-1
    SUMMARY:Föreläsning Linjär algebra TATA24
    DTSTART;TZID=Europe/Stockholm:20250908T100000
    DTEND;TZID=Europe/Stockholm:20250908T120000
    END:VEVENT
    BEGIN:VEVENT
    UID:lab-1
    SUMMARY:Lab Digital Design TSEA12
    DTSTART:20250909T120000Z
    DTEND:20250909T140000Z
    END:VEVENT
    END:VCALENDAR
"};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studyplan"))
        .args(args)
        .env("HOME", home)
        .env_remove("STUDYPLAN_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_calendar(dir: &Path) -> String {
    let path = dir.join("schedule.ics");
    std::fs::write(&path, CALENDAR).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_techniques_list() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["techniques"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pomodoro25"));
    assert!(stdout.contains("deepwork"));
}

#[test]
fn test_techniques_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["techniques", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 6);
}

#[test]
fn test_plan_daily_json() {
    let home = tempfile::tempdir().unwrap();
    let ics = write_calendar(home.path());
    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "plan",
            "--ics-file",
            &ics,
            "--prefs",
            "no studying after 18:00",
            "--view",
            "daily",
            "--date",
            "2025-09-08",
            "--now",
            "2025-09-07T12:00:00+02:00",
            "--json",
        ],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["eventsCount"], 2);
    let blocks = parsed["structuredBlocks"].as_array().unwrap();
    assert!(!blocks.is_empty());
    assert!(parsed["planText"].as_str().unwrap().starts_with("2025-09-08"));
}

#[test]
fn test_plan_is_deterministic_with_fixed_clock() {
    let home = tempfile::tempdir().unwrap();
    let ics = write_calendar(home.path());
    let args = [
        "plan",
        "--ics-file",
        &ics,
        "--prefs",
        "weekends off",
        "--date",
        "2025-09-10",
        "--now",
        "2025-09-07T12:00:00+02:00",
        "--json",
    ];
    let first = run_cli(home.path(), &args);
    let second = run_cli(home.path(), &args);
    assert_eq!(first.2, 0);
    assert_eq!(first.0, second.0);
}

#[test]
fn test_plan_requires_preferences() {
    let home = tempfile::tempdir().unwrap();
    let ics = write_calendar(home.path());
    let (_, stderr, code) = run_cli(home.path(), &["plan", "--ics-file", &ics, "--prefs", "  "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("Preferences are required"));
}

#[test]
fn test_plan_requires_calendar() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["plan", "--prefs", "anything"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("calendar source"));
}

#[test]
fn test_export_writes_ics() {
    let home = tempfile::tempdir().unwrap();
    let ics = write_calendar(home.path());
    let out = home.path().join("plan.ics");
    let (stdout, stderr, code) = run_cli(
        home.path(),
        &[
            "export",
            "--ics-file",
            &ics,
            "--prefs",
            "weekends off",
            "--date",
            "2025-09-08",
            "--now",
            "2025-09-07T12:00:00+02:00",
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("exported"));
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(written.contains("X-WR-CALNAME:Study Plan"));
}

#[test]
fn test_subjects_lists_courses() {
    let home = tempfile::tempdir().unwrap();
    let ics = write_calendar(home.path());
    let (stdout, _, code) = run_cli(home.path(), &["subjects", "--ics-file", &ics]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TATA24"));
    assert!(stdout.contains("TSEA12"));
}

#[test]
fn test_tips() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["tips", "--prefs", "tentamen nästa vecka"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("exam"));
}

#[test]
fn test_config_set_get_reset() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "planning.day_end", "18:00"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "planning.day_end"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "18:00");

    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "planning.day_end"]);
    assert_eq!(stdout.trim(), "20:00");
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "planning.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn test_config_list() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("planning.timezone = Europe/Stockholm"));
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("studyplan"));
}
