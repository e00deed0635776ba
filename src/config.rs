use crate::audio::SampleEncoding;
use anyhow::{bail, Context};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub battle: BattleConfig,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub encoding: SampleEncoding,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Longest silence tolerated inside an audio stream before the line is
    /// abandoned.
    #[serde(default = "default_stream_timeout_seconds")]
    pub stream_timeout_seconds: u64,
}

/// Tuning knobs for the narration mapper and the idle filler timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_hype_every")]
    pub hype_every: usize,
    #[serde(default = "default_frustrated_after")]
    pub frustrated_after: usize,
    #[serde(default = "default_trash_talk_interval_secs")]
    pub trash_talk_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_agent_args")]
    pub args: Vec<String>,
    #[serde(default = "default_prompt_flag")]
    pub prompt_flag: String,
    #[serde(default = "default_resume_flag")]
    pub resume_flag: String,
    #[serde(default = "default_skip_permissions_flag")]
    pub skip_permissions_flag: String,
    #[serde(default)]
    pub skip_permissions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default)]
    pub arena_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub shared_output: bool,
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_true")]
    pub open_results: bool,
    #[serde(default = "default_true")]
    pub commentary: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = Self::project_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        if let Ok(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config at {}", path.display()))?;
        config.apply_defaults();
        Ok(config)
    }

    pub fn init_default() -> anyhow::Result<PathBuf> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config = Self::default();
        fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        Ok(path)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.config_dir().join("agent-narrator").join("config.json"))
    }

    /// Reads the TTS credential from the environment variable named by
    /// `tts.api_key_env`.
    pub fn api_key(&self) -> anyhow::Result<String> {
        match std::env::var(&self.tts.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!(
                "{} is not set; export your TTS API key before starting a session",
                self.tts.api_key_env
            ),
        }
    }

    pub fn arena_dir(&self) -> PathBuf {
        self.battle
            .arena_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("battle_arena"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            bail!("volume must be between 0.0 and 1.0");
        }

        if self.tts.api_key_env.trim().is_empty() {
            bail!("tts.api_key_env must name an environment variable");
        }

        if self.tts.sample_rate == 0 {
            bail!("tts.sample_rate must be greater than 0");
        }

        if self.tts.model_id.trim().is_empty() {
            bail!("tts.model_id must not be empty");
        }

        if self.narration.max_chars < 20 {
            bail!("narration.max_chars must be at least 20");
        }

        if self.agent.program.trim().is_empty() {
            bail!("agent.program must not be empty");
        }

        Ok(())
    }

    fn apply_defaults(&mut self) {
        if self.tts.base_url.as_deref().map(str::trim) == Some("") {
            self.tts.base_url = None;
        }

        if self.tts.language.is_none() {
            self.tts.language = Some("en".to_string());
        }

        if self.narration.history_window == 0 {
            self.narration.history_window = 1;
        }

        if self.agent.args.is_empty() {
            self.agent.args = default_agent_args();
        }
    }

    fn project_path() -> Option<PathBuf> {
        Some(PathBuf::from("agent-narrator.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tts: TtsConfig::default(),
            narration: NarrationConfig::default(),
            agent: AgentConfig::default(),
            battle: BattleConfig::default(),
            volume: default_volume(),
        }
    }
}

impl TtsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_seconds.max(1))
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_api_key_env(),
            model_id: default_model_id(),
            api_version: default_api_version(),
            sample_rate: default_sample_rate(),
            encoding: SampleEncoding::default(),
            language: Some("en".to_string()),
            timeout_seconds: default_timeout_seconds(),
            stream_timeout_seconds: default_stream_timeout_seconds(),
        }
    }
}

impl NarrationConfig {
    /// `None` disables idle fillers.
    pub fn idle_threshold(&self) -> Option<Duration> {
        (self.idle_threshold_ms > 0).then(|| Duration::from_millis(self.idle_threshold_ms))
    }

    /// `None` disables trash talk.
    pub fn trash_talk_interval(&self) -> Option<Duration> {
        (self.trash_talk_interval_secs > 0)
            .then(|| Duration::from_secs(self.trash_talk_interval_secs))
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: default_idle_threshold_ms(),
            history_window: default_history_window(),
            max_chars: default_max_chars(),
            hype_every: default_hype_every(),
            frustrated_after: default_frustrated_after(),
            trash_talk_interval_secs: default_trash_talk_interval_secs(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_agent_args(),
            prompt_flag: default_prompt_flag(),
            resume_flag: default_resume_flag(),
            skip_permissions_flag: default_skip_permissions_flag(),
            skip_permissions: false,
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            arena_dir: None,
            shared_output: true,
            stagger_ms: default_stagger_ms(),
            open_results: true,
            commentary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

fn default_api_key_env() -> String {
    "CARTESIA_API_KEY".to_string()
}

fn default_model_id() -> String {
    "sonic-2".to_string()
}

fn default_api_version() -> String {
    "2024-11-13".to_string()
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_stream_timeout_seconds() -> u64 {
    15
}

fn default_idle_threshold_ms() -> u64 {
    8_000
}

fn default_history_window() -> usize {
    3
}

fn default_max_chars() -> usize {
    300
}

fn default_hype_every() -> usize {
    5
}

fn default_frustrated_after() -> usize {
    2
}

fn default_trash_talk_interval_secs() -> u64 {
    8
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_agent_args() -> Vec<String> {
    vec![
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ]
}

fn default_prompt_flag() -> String {
    "-p".to_string()
}

fn default_resume_flag() -> String {
    "--resume".to_string()
}

fn default_skip_permissions_flag() -> String {
    "--dangerously-skip-permissions".to_string()
}

fn default_stagger_ms() -> u64 {
    1_000
}
