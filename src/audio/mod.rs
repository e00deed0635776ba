pub mod device;
pub mod player;
pub mod wav;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    #[default]
    #[serde(rename = "pcm_s16le")]
    PcmS16Le,
    #[serde(rename = "pcm_f32le")]
    PcmF32Le,
}

impl SampleEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleEncoding::PcmS16Le => "pcm_s16le",
            SampleEncoding::PcmF32Le => "pcm_f32le",
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleEncoding::PcmS16Le => 2,
            SampleEncoding::PcmF32Le => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub encoding: SampleEncoding,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            encoding: SampleEncoding::PcmS16Le,
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

/// Raw audio bytes as they arrived from the synthesis service.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub data: Bytes,
    pub format: PcmFormat,
}

impl AudioChunk {
    pub fn new(data: impl Into<Bytes>, format: PcmFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output available: {0}")]
    Unavailable(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("audio device error: {0}")]
    Device(String),
}

/// An output that sessions open channels on.
pub trait PlaybackDevice: Send + Sync {
    fn open_channel(&self, label: &str) -> Result<Box<dyn AudioChannel>, AudioError>;
}

/// One session's scoped hold on the output. Dropping it releases the device.
#[async_trait]
pub trait AudioChannel: Send {
    /// Queues a chunk behind everything written before it.
    fn write(&mut self, chunk: &AudioChunk) -> Result<(), AudioError>;

    /// Resolves once every queued chunk has been rendered.
    async fn drain(&mut self) -> Result<(), AudioError>;

    /// Drops queued audio immediately.
    fn stop(&mut self);
}

/// Discards audio. Used with `--mute`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevice;

struct NullChannel;

impl PlaybackDevice for NullDevice {
    fn open_channel(&self, _label: &str) -> Result<Box<dyn AudioChannel>, AudioError> {
        Ok(Box::new(NullChannel))
    }
}

#[async_trait]
impl AudioChannel for NullChannel {
    fn write(&mut self, _chunk: &AudioChunk) -> Result<(), AudioError> {
        Ok(())
    }

    async fn drain(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Converts little-endian PCM bytes to `f32` samples, carrying a partial
/// trailing sample over to the next chunk.
#[derive(Debug, Default)]
pub struct SampleDecoder {
    carry: Vec<u8>,
}

impl SampleDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &AudioChunk) -> Vec<f32> {
        let width = chunk.format.encoding.bytes_per_sample();
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(&chunk.data);

        let whole = bytes.len() - bytes.len() % width;
        self.carry = bytes[whole..].to_vec();

        match chunk.format.encoding {
            SampleEncoding::PcmS16Le => bytes[..whole]
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
                .collect(),
            SampleEncoding::PcmF32Le => bytes[..whole]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        }
    }
}
