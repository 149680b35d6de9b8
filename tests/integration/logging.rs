//! Logging setup used by the binary

use annomarket::logging::{log_filter, LogFormat, DEFAULT_LOG_FILTER};
use assert_cmd::Command;

#[test]
fn test_filter_falls_back_to_default() {
    assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
    assert_eq!(log_filter(Some("annomarket=loud")).to_string(), DEFAULT_LOG_FILTER);
    assert_eq!(log_filter(Some("annomarket=debug")).to_string(), "annomarket=debug");
}

#[test]
fn test_log_format_setting() {
    assert_eq!(LogFormat::from_setting(None), LogFormat::Plain);
    assert_eq!(LogFormat::from_setting(Some("JSON")), LogFormat::Json);
    assert_eq!(LogFormat::from_setting(Some("json")), LogFormat::Json);
    assert_eq!(LogFormat::from_setting(Some("pretty")), LogFormat::Plain);
}

fn failing_run(log_format: Option<&str>) -> String {
    let mut cmd = Command::cargo_bin("annomarket").unwrap();
    cmd.env_remove("ANNOMARKET_API_KEY_ID")
        .env_remove("ANNOMARKET_API_PASSWORD")
        .env_remove("LOG_FORMAT")
        .env("RUST_LOG", "annomarket=info")
        .arg("list-jobs");
    if let Some(format) = log_format {
        cmd.env("LOG_FORMAT", format);
    }
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_binary_writes_json_logs_to_stderr() {
    let stderr = failing_run(Some("json"));
    let line = stderr
        .lines()
        .find(|line| line.contains("Command failed"))
        .expect("failure should be logged");
    let record: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(record["level"], "ERROR");
}

#[test]
fn test_binary_writes_plain_logs_by_default() {
    let stderr = failing_run(None);
    let line = stderr
        .lines()
        .find(|line| line.contains("Command failed"))
        .expect("failure should be logged");
    assert!(!line.trim_start().starts_with('{'));
    assert!(line.contains("ERROR"));
}
