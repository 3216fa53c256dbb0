//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config file.

use std::path::Path;
use std::process::Command;

const DISCORD_ENV: &[&str] = &[
    "DISCORD_PARTICIPANTS",
    "DISCORD_MIMO_CHANNEL_ID",
    "DISCORD_CORE_TIME_CHANNEL_ID",
    "DISCORD_ATTENDANCE_CHECK_CHANNEL_ID",
    "DISCORD_GUILD_ID",
    "DISCORD_BOT_TOKEN",
];

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str], env: &[(&str, &str)]) -> (i32, String, String) {
    let config = home.join("config.toml");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rollcall"));
    cmd.arg("--config").arg(&config).args(args).env("HOME", home);
    for key in DISCORD_ENV {
        cmd.env_remove(key);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd.output().expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["--help"], &[]);
    assert_eq!(code, 0);
    for command in ["run", "thread", "report", "config", "auth"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_config_list_creates_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"], &[]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["thresholds"]["late_to_warning"], 3);
    assert_eq!(json["schedule"]["utc_offset_hours"], 9);
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["config", "set", "thresholds.warnings_to_inactive", "5"],
        &[],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (code, stdout, _) = run_cli(
        home.path(),
        &["config", "get", "thresholds.warnings_to_inactive"],
        &[],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "discord.nope"], &[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_set_rejects_bad_value() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["config", "set", "engine.require_image_for_morning", "sometimes"],
        &[],
    );
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_config_set_rejects_zero_threshold() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["config", "set", "thresholds.late_to_warning", "0"],
        &[],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("thresholds.late_to_warning"));

    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "thresholds.late_to_warning"], &[]);
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_report_parse_prints_snapshot() {
    let home = tempfile::tempdir().unwrap();
    let older = home.path().join("older.txt");
    let newer = home.path().join("newer.txt");
    std::fs::write(&older, "2026-10 출석결과\nKim : 지각:1, 결석:0\nLee : 지각:0, 결석:1").unwrap();
    std::fs::write(
        &newer,
        "2026-10 출석결과\nKim : 지각:2, 결석:0\nLee : 지각:0, 결석:1\nChoi : 지각:0, 결석:2\n\nActive (1명)\n- Kim\nInActive (1명)\n- Lee",
    )
    .unwrap();

    let (code, stdout, stderr) = run_cli(
        home.path(),
        &[
            "report",
            "parse",
            older.to_str().unwrap(),
            newer.to_str().unwrap(),
        ],
        &[("DISCORD_PARTICIPANTS", "u1:Kim,u2:Lee")],
    );
    assert_eq!(code, 0, "stderr: {stderr}");

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["records"]["u1"]["late"], 2);
    assert_eq!(json["records"]["u1"]["status"], "active");
    assert_eq!(json["records"]["u2"]["absent"], 1);
    assert_eq!(json["records"]["u2"]["status"], "inactive");
    assert!(stderr.contains("Choi"));
}

#[test]
fn test_report_parse_requires_files() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["report", "parse"], &[]);
    assert_ne!(code, 0);
}

#[test]
fn test_run_rejects_malformed_time() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["run", "--at", "yesterday"], &[]);
    assert_ne!(code, 0);
    assert!(stderr.contains("RFC 3339"));
}
