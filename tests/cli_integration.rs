use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn run_plexi(config_dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plexi"));
    cmd.args(args)
        .env("PLEXI_CONFIG_DIR", config_dir)
        .env_remove("PLEXI_API_BASE_URL")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_OUTPUT");
    cmd.output().expect("failed to run plexi binary")
}

fn unique_config_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("plexi-cli-{suffix}-{stamp}-{}", std::process::id()))
}

#[test]
fn set_key_then_view_key_shows_masked_key() {
    let dir = unique_config_dir("mask");

    let output = run_plexi(&dir, &["set-key", "pplx-0123456789abcdef"]);
    assert!(output.status.success(), "set-key should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("API key set successfully"),
        "unexpected output:\n{stdout}"
    );

    let output = run_plexi(&dir, &["view-key"]);
    assert!(output.status.success(), "view-key should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pplx*************cdef"),
        "expected masked key, got:\n{stdout}"
    );
    assert!(
        !stdout.contains("pplx-0123456789abcdef"),
        "full key must never be printed:\n{stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn clear_key_removes_the_stored_key() {
    let dir = unique_config_dir("clear");

    run_plexi(&dir, &["set-key", "pplx-0123456789abcdef"]);
    let output = run_plexi(&dir, &["clear-key"]);
    assert!(output.status.success(), "clear-key should succeed");

    let output = run_plexi(&dir, &["view-key"]);
    assert!(
        !output.status.success(),
        "view-key should fail once the key is cleared"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key not set"),
        "unexpected stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn query_without_key_fails_before_any_request() {
    let dir = unique_config_dir("no-key");

    let output = run_plexi(&dir, &["query", "what is rust"]);
    assert!(!output.status.success(), "query without a key should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key not set"),
        "unexpected stderr:\n{stderr}"
    );

    // The credential check runs before history recording, so nothing may
    // have been written.
    assert!(
        !dir.join("config.json").exists(),
        "no config should be written for a rejected query"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn history_prints_notice_when_empty() {
    let dir = unique_config_dir("history-empty");

    let output = run_plexi(&dir, &["history"]);
    assert!(output.status.success(), "history should succeed when empty");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No query history found."),
        "unexpected output:\n{stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn history_lists_recorded_queries_newest_first() {
    let dir = unique_config_dir("history-list");
    fs::create_dir_all(&dir).expect("failed to create config directory");
    fs::write(
        dir.join("config.json"),
        r#"{
            "apiKey": "pplx-0123456789abcdef",
            "history": [
                {"question": "newest question", "model": "sonar-large", "timestamp": 1700000001000},
                {"question": "older question", "model": "sonar", "timestamp": 1700000000000}
            ]
        }"#,
    )
    .expect("failed to seed config");

    let output = run_plexi(&dir, &["history"]);
    assert!(output.status.success(), "history should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let newest = stdout
        .find("1. newest question")
        .expect("newest entry should be listed first");
    let older = stdout
        .find("2. older question")
        .expect("older entry should be listed second");
    assert!(newest < older, "entries out of order:\n{stdout}");
    assert!(
        stdout.contains("Model: sonar-large"),
        "unexpected output:\n{stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn models_lists_the_static_catalog() {
    let dir = unique_config_dir("models");

    let output = run_plexi(&dir, &["models"]);
    assert!(output.status.success(), "models should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for model in ["sonar", "sonar-large", "codellama-70b", "mixtral-8x7b"] {
        assert!(stdout.contains(model), "missing {model} in:\n{stdout}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn no_arguments_prints_help() {
    let dir = unique_config_dir("help");

    let output = run_plexi(&dir, &[]);
    assert!(!output.status.success(), "bare invocation should not run");
    let rendered = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(rendered.contains("Usage:"), "expected help text:\n{rendered}");
    for subcommand in ["set-key", "view-key", "clear-key", "query", "models", "history"] {
        assert!(
            rendered.contains(subcommand),
            "help should list {subcommand}:\n{rendered}"
        );
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn json_log_format_emits_json_lines_on_stderr() {
    let dir = unique_config_dir("json-logs");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plexi"));
    cmd.arg("history")
        .env("PLEXI_CONFIG_DIR", &dir)
        .env("RUST_LOG", "plexi=debug")
        .env("LOG_FORMAT", "json")
        .env("LOG_OUTPUT", "stderr");
    let output = cmd.output().expect("failed to run plexi binary");
    assert!(output.status.success(), "history should succeed");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: Vec<Value> = stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(|line| serde_json::from_str::<Value>(line).expect("line should be valid JSON"))
        .collect();
    assert!(
        parsed.iter().any(|entry| {
            entry
                .get("fields")
                .and_then(|fields| fields.get("message"))
                .and_then(Value::as_str)
                == Some("loaded runtime configuration")
        }),
        "expected startup log message in JSON output, got stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
