use agent_narrator::audio::SampleEncoding;
use agent_narrator::config::Config;
use std::time::Duration;

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    config.validate().unwrap();
    assert_eq!(config.tts.api_key_env, "CARTESIA_API_KEY");
    assert_eq!(config.tts.sample_rate, 24_000);
    assert_eq!(config.tts.stream_timeout(), Duration::from_secs(15));
    assert_eq!(config.narration.idle_threshold(), Some(Duration::from_secs(8)));
    assert_eq!(config.narration.history_window, 3);
    assert_eq!(config.agent.program, "claude");
    assert!(config.battle.shared_output);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "tts": {"encoding": "pcm_f32le", "base_url": ""},
            "narration": {"idle_threshold_ms": 0, "history_window": 0},
            "agent": {"args": []},
            "volume": 0.5
        }"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.tts.encoding, SampleEncoding::PcmF32Le);
    assert_eq!(config.tts.base_url, None);
    assert_eq!(config.tts.model_id, "sonic-2");
    assert_eq!(config.tts.language.as_deref(), Some("en"));
    assert_eq!(config.narration.idle_threshold(), None);
    assert_eq!(config.narration.history_window, 1);
    assert_eq!(config.narration.max_chars, 300);
    assert_eq!(config.agent.args, vec!["--output-format", "stream-json", "--verbose"]);
    assert_eq!(config.volume, 0.5);
}

#[test]
fn invalid_json_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ nope").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut config = Config::default();
    config.volume = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.narration.max_chars = 5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.agent.program = " ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn api_key_comes_from_the_configured_variable() {
    let mut config = Config::default();
    config.tts.api_key_env = "AGENT_NARRATOR_TEST_KEY_PRESENT".to_string();
    std::env::set_var("AGENT_NARRATOR_TEST_KEY_PRESENT", "  sk-test  ");
    assert_eq!(config.api_key().unwrap(), "sk-test");

    config.tts.api_key_env = "AGENT_NARRATOR_TEST_KEY_MISSING".to_string();
    std::env::remove_var("AGENT_NARRATOR_TEST_KEY_MISSING");
    let err = config.api_key().unwrap_err();
    assert!(err.to_string().contains("AGENT_NARRATOR_TEST_KEY_MISSING"));
}

#[test]
fn arena_dir_defaults_under_temp() {
    let config = Config::default();
    assert_eq!(config.arena_dir(), std::env::temp_dir().join("battle_arena"));
}
