//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary config dir.

use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &tempfile::TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathpacer"))
        .args(args)
        .env("BREATHPACER_CONFIG_DIR", dir.path())
        .env_remove("BREATHPACER_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("event line is JSON"))
        .collect()
}

#[test]
fn test_list() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["list"]);
    assert_eq!(code, 0);
    for id in ["4-8", "5-5", "cyclic-sighing", "humming-breath"] {
        assert!(out.contains(id), "missing {id} in:\n{out}");
    }
}

#[test]
fn test_list_json() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["list", "--json"]);
    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 4);
    assert_eq!(parsed[2]["id"], "cyclic-sighing");
    assert_eq!(parsed[2]["cycle_secs"], 11.5);
}

#[test]
fn test_show() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["show", "cyclic-sighing"]);
    assert_eq!(code, 0);
    assert!(out.contains("Sip Inhale"));
    assert!(out.contains("https://"));
}

#[test]
fn test_show_unknown_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, err, code) = run_cli(&dir, &["show", "box-breathing"]);
    assert_eq!(code, 1);
    assert!(err.contains("error:"), "{err}");
}

#[test]
fn test_simulate_json_completes() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["simulate", "5-5", "--duration", "12", "--json"]);
    assert_eq!(code, 0);

    let events = json_lines(&out);
    assert_eq!(events.first().unwrap()["type"], "SessionStarted");
    let last = events.last().unwrap();
    assert_eq!(last["type"], "SessionEnded");
    assert_eq!(last["reason"], "completed");
    assert_eq!(last["at_ms"], 12_050);

    let entered: Vec<&Value> = events.iter().filter(|e| e["type"] == "PhaseEntered").collect();
    assert_eq!(entered.len(), 3);
    assert_eq!(entered[0]["phase"], "Inhale");
    assert_eq!(entered[0]["at_ms"], 50);
    assert!(events.iter().all(|e| e["type"] != "DisplayTick"));
}

#[test]
fn test_simulate_stop_at_ends_early() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(
        &dir,
        &["simulate", "4-8", "--minutes", "2", "--stop-at", "3.5", "--json"],
    );
    assert_eq!(code, 0);
    let events = json_lines(&out);
    let ended: Vec<&Value> = events.iter().filter(|e| e["type"] == "SessionEnded").collect();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["reason"], "ended_early");
    assert_eq!(ended[0]["at_ms"], 3_550);
    assert_eq!(ended[0]["elapsed_secs"], 3);

    // Nothing fires after the requested instant.
    let last_tick = events
        .iter()
        .filter(|e| e["type"] == "CountdownTick")
        .last()
        .unwrap();
    assert_eq!(last_tick["at_ms"], 3_050);
    assert!(events.iter().all(|e| e["at_ms"].as_u64().map_or(true, |t| t <= 3_550)));
}

#[test]
fn test_simulate_rejects_zero_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (_, err, code) = run_cli(&dir, &["simulate", "5-5", "--duration", "0"]);
    assert_eq!(code, 1);
    assert!(err.contains("error:"));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["config", "get", "session.default_technique"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "5-5");

    let (_, _, code) = run_cli(&dir, &["config", "set", "audio.volume", "0.8"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&dir, &["config", "get", "audio.volume"]);
    assert_eq!(out.trim(), "0.8");

    let (_, _, code) = run_cli(&dir, &["config", "set", "audio.volume", "loud"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_path_uses_override_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (out, _, code) = run_cli(&dir, &["config", "path"]);
    assert_eq!(code, 0);
    assert!(out.trim().starts_with(dir.path().to_str().unwrap()));
}
