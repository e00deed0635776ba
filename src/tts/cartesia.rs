//! Cartesia streaming TTS over HTTP Server-Sent Events.

use crate::audio::{AudioChunk, PcmFormat};
use crate::config::TtsConfig;
use crate::narration::NarrationRequest;
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{sse, AudioStream, SynthesisError, Synthesizer};

pub const DEFAULT_BASE_URL: &str = "https://api.cartesia.ai";

pub struct CartesiaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_version: String,
    model_id: String,
    language: Option<String>,
    format: PcmFormat,
}

impl CartesiaClient {
    pub fn new(config: &TtsConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.stream_timeout())
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            api_version: config.api_version.clone(),
            model_id: config.model_id.clone(),
            language: config.language.clone(),
            format: PcmFormat {
                encoding: config.encoding,
                sample_rate: config.sample_rate,
                channels: 1,
            },
        })
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn request_body(&self, request: &NarrationRequest) -> Value {
        let mut voice = json!({ "mode": "id", "id": request.voice_id });
        if request.speed.is_some() || !request.emotion.is_empty() {
            let mut controls = json!({});
            if let Some(speed) = request.speed {
                controls["speed"] = json!(speed);
            }
            if !request.emotion.is_empty() {
                controls["emotion"] = json!(request.emotion);
            }
            voice["__experimental_controls"] = controls;
        }

        let mut body = json!({
            "model_id": self.model_id,
            "transcript": request.text,
            "voice": voice,
            "output_format": {
                "container": "raw",
                "encoding": self.format.encoding.as_str(),
                "sample_rate": self.format.sample_rate,
            },
        });
        if let Some(language) = &self.language {
            body["language"] = json!(language);
        }
        body
    }
}

#[async_trait]
impl Synthesizer for CartesiaClient {
    fn name(&self) -> &str {
        "cartesia"
    }

    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioStream, SynthesisError> {
        let url = format!("{}/tts/sse", self.base_url);
        tracing::debug!(voice = %request.voice_id, chars = request.text.len(), "requesting speech");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Cartesia-Version", &self.api_version)
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::from_status(status.as_u16(), &body, retry_after));
        }

        let lines = sse::data_lines(response.bytes_stream());
        Ok(audio_stream(lines, self.format))
    }
}

/// One decoded SSE message from the synthesis endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Audio(Vec<u8>),
    Done,
    Error(String),
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    frame_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<Value>,
}

pub fn parse_frame(payload: &str) -> Result<Frame, SynthesisError> {
    let raw: RawFrame = serde_json::from_str(payload)
        .map_err(|err| SynthesisError::Stream(format!("invalid frame JSON: {err}")))?;

    if let Some(error) = raw.error {
        let message = match error {
            Value::String(message) => message,
            other => other.to_string(),
        };
        return Ok(Frame::Error(message));
    }

    match raw.frame_type.as_deref() {
        Some("error") => return Ok(Frame::Error("provider reported an error".to_string())),
        Some("done") => return Ok(Frame::Done),
        _ => {}
    }

    if let Some(data) = raw.data.filter(|d| !d.is_empty()) {
        let audio = base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|err| SynthesisError::Stream(format!("invalid base64 audio: {err}")))?;
        return Ok(Frame::Audio(audio));
    }

    if raw.done == Some(true) {
        return Ok(Frame::Done);
    }

    Ok(Frame::Ignored)
}

/// Turns SSE payloads into audio chunks, ending at the `done` frame or at
/// the first error.
pub fn audio_stream<S>(lines: S, format: PcmFormat) -> AudioStream
where
    S: Stream<Item = Result<String, SynthesisError>> + Send + 'static,
{
    let lines = Box::pin(lines);
    futures::stream::unfold((lines, false), move |(mut lines, done)| async move {
        if done {
            return None;
        }
        loop {
            let payload = match lines.next().await? {
                Ok(payload) => payload,
                Err(err) => return Some((Err(err), (lines, true))),
            };
            match parse_frame(&payload) {
                Ok(Frame::Audio(bytes)) => {
                    return Some((Ok(AudioChunk::new(bytes, format)), (lines, false)));
                }
                Ok(Frame::Done) => return None,
                Ok(Frame::Ignored) => continue,
                Ok(Frame::Error(message)) => {
                    return Some((Err(SynthesisError::Stream(message)), (lines, true)));
                }
                Err(err) => return Some((Err(err), (lines, true))),
            }
        }
    })
    .boxed()
}
