use assert_cmd::Command;
use predicates::prelude::*;

/// Runs the binary from an empty directory with no user config or key.
fn narrator(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agent-narrator").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("CARTESIA_API_KEY");
    cmd
}

#[test]
fn missing_api_key_fails_before_starting() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .args(["narrate", "say hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CARTESIA_API_KEY"));
}

#[test]
fn battle_demo_also_needs_the_key() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .args(["battle", "--demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CARTESIA_API_KEY"));
}

#[test]
fn battle_requires_a_task() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .arg("battle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TASK"));
}

#[test]
fn personalities_lists_streamers_and_competitors() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .arg("personalities")
        .assert()
        .success()
        .stdout(predicate::str::contains("The Hype Beast"))
        .stdout(predicate::str::contains("SpeedDemon"))
        .stdout(predicate::str::contains("Wildcard"));
}

#[test]
fn personalities_json_is_an_array() {
    let home = tempfile::tempdir().unwrap();
    let output = narrator(&home)
        .args(["personalities", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let list = parsed.as_array().unwrap();
    assert_eq!(list.len(), 7);
    assert_eq!(list[4]["name"], "SpeedDemon");
    assert!(list[0]["approach"].is_null());
}

#[test]
fn invalid_project_config_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("agent-narrator.json"), r#"{"volume": 3.0}"#).unwrap();
    narrator(&home)
        .args(["config", "--validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("volume"));
}

#[test]
fn config_show_prints_defaults() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"api_key_env\": \"CARTESIA_API_KEY\""));
}

#[test]
fn unknown_personality_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    narrator(&home)
        .env("CARTESIA_API_KEY", "sk-test")
        .args(["--mute", "narrate", "--personality", "nobody", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown personality"));
}
