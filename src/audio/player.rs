use crate::narration::NarrationRequest;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::{AudioChannel, AudioChunk, PlaybackDevice};

/// Serializes playback across sessions that share one physical output.
pub type OutputFloor = Arc<Mutex<()>>;

/// One request's audio, streamed in as synthesis produces it.
pub struct Utterance {
    pub request: NarrationRequest,
    pub chunks: mpsc::UnboundedReceiver<AudioChunk>,
}

#[derive(Debug, Default, Clone)]
pub struct PlaybackStats {
    pub played: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

/// Plays utterances strictly in arrival order, one at a time.
///
/// The channel is opened on first use and dropped when the queue closes,
/// playback fails, or `cancel` fires. A device error disables playback for
/// the rest of this session; later utterances are drained and skipped so
/// upstream stages never stall.
pub async fn run_playback(
    device: Arc<dyn PlaybackDevice>,
    label: String,
    floor: Option<OutputFloor>,
    mut utterances: mpsc::UnboundedReceiver<Utterance>,
    cancel: CancellationToken,
) -> PlaybackStats {
    let mut stats = PlaybackStats::default();
    let mut channel: Option<Box<dyn AudioChannel>> = None;

    loop {
        let utterance = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = utterances.recv() => match next {
                Some(utterance) => utterance,
                None => break,
            },
        };

        if stats.error.is_some() {
            stats.skipped += 1;
            continue;
        }

        if channel.is_none() {
            match device.open_channel(&label) {
                Ok(opened) => channel = Some(opened),
                Err(err) => {
                    tracing::error!(agent = %label, error = %err, "audio output unavailable; continuing without sound");
                    stats.error = Some(err.to_string());
                    stats.skipped += 1;
                    continue;
                }
            }
        }
        let Some(out) = channel.as_mut() else {
            continue;
        };

        match play_one(&mut **out, utterance, floor.as_ref(), &cancel).await {
            Outcome::Played => stats.played += 1,
            Outcome::Empty => stats.skipped += 1,
            Outcome::Cancelled => {
                out.stop();
                break;
            }
            Outcome::Failed(err) => {
                tracing::error!(agent = %label, error = %err, "audio playback failed; continuing without sound");
                out.stop();
                stats.error = Some(err);
                stats.skipped += 1;
                channel = None;
            }
        }
    }

    if let Some(mut out) = channel.take() {
        if cancel.is_cancelled() {
            out.stop();
        }
    }

    stats
}

enum Outcome {
    Played,
    Empty,
    Cancelled,
    Failed(String),
}

async fn play_one(
    out: &mut dyn AudioChannel,
    mut utterance: Utterance,
    floor: Option<&OutputFloor>,
    cancel: &CancellationToken,
) -> Outcome {
    // The floor is only claimed once there is audio in hand, so a line that
    // is slow to start never holds up other sessions.
    let first = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Outcome::Cancelled,
        chunk = utterance.chunks.recv() => chunk,
    };
    let Some(first) = first else {
        return Outcome::Empty;
    };

    let _turn = match floor {
        Some(floor) => tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            guard = floor.lock() => Some(guard),
        },
        None => None,
    };

    tracing::debug!(text = %utterance.request.text, "playback started");
    let mut next = Some(first);
    while let Some(chunk) = next {
        if let Err(err) = out.write(&chunk) {
            return Outcome::Failed(err.to_string());
        }
        next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            chunk = utterance.chunks.recv() => chunk,
        };
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Outcome::Cancelled,
        drained = out.drain() => match drained {
            Ok(()) => Outcome::Played,
            Err(err) => Outcome::Failed(err.to_string()),
        },
    }
}
