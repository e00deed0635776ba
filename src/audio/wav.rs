use anyhow::{bail, Context};
use std::path::Path;

use super::{AudioChunk, SampleEncoding};

/// Writes collected PCM chunks to a WAV file in their native encoding.
pub fn write_wav(path: &Path, chunks: &[AudioChunk]) -> anyhow::Result<()> {
    let Some(first) = chunks.first() else {
        bail!("no audio to write");
    };
    let format = first.format;
    if chunks.iter().any(|c| c.format != format) {
        bail!("audio chunks disagree on sample format");
    }

    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: (format.encoding.bytes_per_sample() * 8) as u16,
        sample_format: match format.encoding {
            SampleEncoding::PcmS16Le => hound::SampleFormat::Int,
            SampleEncoding::PcmF32Le => hound::SampleFormat::Float,
        },
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("create wav file {}", path.display()))?;

    let bytes: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
    match format.encoding {
        SampleEncoding::PcmS16Le => {
            for b in bytes.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([b[0], b[1]]))?;
            }
        }
        SampleEncoding::PcmF32Le => {
            for b in bytes.chunks_exact(4) {
                writer.write_sample(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))?;
            }
        }
    }

    writer.finalize().context("finalize wav file")?;
    Ok(())
}
