pub mod cartesia;
pub mod sse;

use crate::audio::AudioChunk;
use crate::narration::NarrationRequest;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

/// Audio for one request, yielded as the provider streams it. Finite and
/// not restartable.
pub type AudioStream = BoxStream<'static, Result<AudioChunk, SynthesisError>>;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed audio stream: {0}")]
    Stream(String),
}

impl SynthesisError {
    /// Classifies a non-success HTTP response.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let message = error_message(body, status);
        match status {
            401 | 403 => SynthesisError::Auth { status, message },
            429 => SynthesisError::RateLimited {
                message,
                retry_after,
            },
            _ => SynthesisError::Api { status, message },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SynthesisError::Network(_) => "network",
            SynthesisError::Auth { .. } => "auth",
            SynthesisError::RateLimited { .. } => "rate_limited",
            SynthesisError::Api { .. } => "api",
            SynthesisError::Stream(_) => "stream",
        }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        SynthesisError::Network(err.to_string())
    }
}

fn error_message(body: &str, status: u16) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|json| {
        json.pointer("/error/message")
            .or_else(|| json.get("error"))
            .or_else(|| json.get("message"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("HTTP {status}"),
        None => body.trim().chars().take(200).collect(),
    }
}

/// A remote text-to-speech provider.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Starts synthesis. Connection, credential and quota failures are
    /// returned here, before any chunk is produced.
    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioStream, SynthesisError>;
}

/// Drains a stream into memory, stopping at the first error.
pub async fn collect(mut stream: AudioStream) -> Result<Vec<AudioChunk>, SynthesisError> {
    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk?);
    }
    Ok(chunks)
}
