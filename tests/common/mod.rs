#![allow(dead_code)]

use agent_narrator::audio::{AudioChannel, AudioChunk, AudioError, PcmFormat, PlaybackDevice};
use agent_narrator::config::{AgentConfig, NarrationConfig};
use agent_narrator::narration::NarrationRequest;
use agent_narrator::session::SessionContext;
use agent_narrator::tts::{AudioStream, SynthesisError, Synthesizer};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Returns the request text as audio, or a network error for requests
/// containing `FAIL` or addressed to `fail_voice`.
#[derive(Default)]
pub struct FakeSynth {
    pub requests: Arc<Mutex<Vec<NarrationRequest>>>,
    pub fail_voice: Option<String>,
}

impl FakeSynth {
    pub fn texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }
}

#[async_trait]
impl Synthesizer for FakeSynth {
    fn name(&self) -> &str {
        "fake"
    }

    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioStream, SynthesisError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.text.contains("FAIL") || self.fail_voice.as_deref() == Some(&request.voice_id) {
            return Err(SynthesisError::Network("connection refused".to_string()));
        }
        let chunk = AudioChunk::new(request.text.clone().into_bytes(), PcmFormat::default());
        Ok(futures::stream::iter(vec![Ok(chunk)]).boxed())
    }
}

/// Sends the first chunk of every line, then goes silent forever.
#[derive(Default)]
pub struct StallingSynth;

#[async_trait]
impl Synthesizer for StallingSynth {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioStream, SynthesisError> {
        let chunk = AudioChunk::new(request.text.clone().into_bytes(), PcmFormat::default());
        Ok(futures::stream::iter(vec![Ok(chunk)])
            .chain(futures::stream::pending())
            .boxed())
    }
}

/// Records what each channel wrote, tagged with the channel label.
///
/// With `drain_delay`, every utterance takes that long to finish playing;
/// `on_drained` runs each time one has finished.
#[derive(Default)]
pub struct FakeDevice {
    pub played: Arc<Mutex<Vec<(String, String)>>>,
    pub open_channels: Arc<AtomicUsize>,
    pub fail: bool,
    pub drain_delay: Duration,
    pub on_drained: Option<DrainHook>,
}

pub type DrainHook = Arc<dyn Fn() + Send + Sync>;

impl FakeDevice {
    pub fn texts(&self) -> Vec<String> {
        self.played
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn open(&self) -> usize {
        self.open_channels.load(Ordering::SeqCst)
    }
}

struct FakeChannel {
    label: String,
    played: Arc<Mutex<Vec<(String, String)>>>,
    open_channels: Arc<AtomicUsize>,
    drain_delay: Duration,
    on_drained: Option<DrainHook>,
}

impl PlaybackDevice for FakeDevice {
    fn open_channel(&self, label: &str) -> Result<Box<dyn AudioChannel>, AudioError> {
        if self.fail {
            return Err(AudioError::Device("device busy".to_string()));
        }
        self.open_channels.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeChannel {
            label: label.to_string(),
            played: self.played.clone(),
            open_channels: self.open_channels.clone(),
            drain_delay: self.drain_delay,
            on_drained: self.on_drained.clone(),
        }))
    }
}

#[async_trait]
impl AudioChannel for FakeChannel {
    fn write(&mut self, chunk: &AudioChunk) -> Result<(), AudioError> {
        let text = String::from_utf8_lossy(&chunk.data).to_string();
        self.played.lock().unwrap().push((self.label.clone(), text));
        Ok(())
    }

    async fn drain(&mut self) -> Result<(), AudioError> {
        if !self.drain_delay.is_zero() {
            tokio::time::sleep(self.drain_delay).await;
        }
        if let Some(hook) = &self.on_drained {
            hook();
        }
        Ok(())
    }

    fn stop(&mut self) {}
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        self.open_channels.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs `script` through `sh -c`; the prompt lands in `$0` and is ignored.
pub fn shell_agent(script: &str) -> AgentConfig {
    AgentConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        prompt_flag: String::new(),
        ..AgentConfig::default()
    }
}

pub fn replay_agent(fixture: &Path) -> AgentConfig {
    shell_agent(&format!("cat '{}'", fixture.display()))
}

pub fn quiet_narration() -> NarrationConfig {
    NarrationConfig {
        idle_threshold_ms: 0,
        trash_talk_interval_secs: 0,
        ..NarrationConfig::default()
    }
}

pub fn context(
    synth: Arc<FakeSynth>,
    device: Arc<FakeDevice>,
    agent: AgentConfig,
    narration: NarrationConfig,
) -> SessionContext {
    SessionContext {
        synthesizer: synth,
        device,
        narration,
        agent,
        floor: None,
        stall_timeout: Duration::from_secs(5),
        cancel: CancellationToken::new(),
        seed: Some(7),
    }
}

pub fn write_fixture(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("events.jsonl");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

pub async fn wait_until(mut ready: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !ready() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub const TEXT_START: &str =
    r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Let's start"}]}}"#;
pub const WRITE_FILE: &str = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"write_file","input":{"path":"a.py"}}]}}"#;
pub const RESULT_OK: &str =
    r#"{"type":"result","subtype":"success","is_error":false,"result":"done","session_id":"abc-123"}"#;
