use crate::audio::player::{run_playback, OutputFloor, PlaybackStats, Utterance};
use crate::audio::PlaybackDevice;
use crate::narration::NarrationRequest;
use crate::tts::Synthesizer;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What happened to the lines a session asked to speak.
#[derive(Debug, Default, Clone, Serialize)]
pub struct VoiceReport {
    pub requested: usize,
    pub synthesis_failures: usize,
    pub played: usize,
    pub skipped: usize,
    pub playback_error: Option<String>,
}

#[derive(Debug, Default)]
struct SynthesisStats {
    requested: usize,
    failures: usize,
}

/// Synthesis and playback stages for one session.
///
/// `say` never waits: requests queue for the synthesis task, which hands
/// each utterance to the playback task as soon as its stream opens and then
/// pumps chunks into it. Playback order is request order. A stream that goes
/// quiet for longer than the stall timeout is abandoned, which ends that
/// utterance and frees the output for everyone else.
pub struct Voice {
    requests: mpsc::UnboundedSender<NarrationRequest>,
    synthesis: JoinHandle<SynthesisStats>,
    playback: JoinHandle<PlaybackStats>,
}

impl Voice {
    pub fn start(
        synthesizer: Arc<dyn Synthesizer>,
        device: Arc<dyn PlaybackDevice>,
        label: String,
        floor: Option<OutputFloor>,
        stall_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();

        let playback = tokio::spawn(run_playback(
            device,
            label.clone(),
            floor,
            utterance_rx,
            cancel.clone(),
        ));
        let synthesis = tokio::spawn(run_synthesis(
            synthesizer,
            label,
            request_rx,
            utterance_tx,
            stall_timeout,
            cancel,
        ));

        Self {
            requests: request_tx,
            synthesis,
            playback,
        }
    }

    /// Queues a line. Returns false once the voice has shut down.
    pub fn say(&self, request: NarrationRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// Closes the queue and waits for everything already queued to be
    /// spoken, or abandoned if the session was cancelled.
    pub async fn finish(self) -> VoiceReport {
        drop(self.requests);

        let synthesis = self.synthesis.await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "synthesis task ended abnormally");
            SynthesisStats::default()
        });
        let playback = self.playback.await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "playback task ended abnormally");
            PlaybackStats::default()
        });

        VoiceReport {
            requested: synthesis.requested,
            synthesis_failures: synthesis.failures,
            played: playback.played,
            skipped: playback.skipped,
            playback_error: playback.error,
        }
    }
}

async fn run_synthesis(
    synthesizer: Arc<dyn Synthesizer>,
    label: String,
    mut requests: mpsc::UnboundedReceiver<NarrationRequest>,
    utterances: mpsc::UnboundedSender<Utterance>,
    stall_timeout: Duration,
    cancel: CancellationToken,
) -> SynthesisStats {
    let mut stats = SynthesisStats::default();

    loop {
        let request = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = requests.recv() => match next {
                Some(request) => request,
                None => break,
            },
        };
        stats.requested += 1;

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            opened = tokio::time::timeout(stall_timeout, synthesizer.synthesize(&request)) => opened,
        };
        let mut stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                stats.failures += 1;
                tracing::warn!(agent = %label, provider = synthesizer.name(), kind = err.kind(), error = %err, "synthesis failed; skipping line");
                continue;
            }
            Err(_) => {
                stats.failures += 1;
                tracing::warn!(agent = %label, provider = synthesizer.name(), ?stall_timeout, "synthesis did not start in time; skipping line");
                continue;
            }
        };

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        if utterances
            .send(Utterance {
                request,
                chunks: chunk_rx,
            })
            .is_err()
        {
            break;
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return stats,
                next = tokio::time::timeout(stall_timeout, stream.next()) => next,
            };
            match next {
                Ok(Some(Ok(chunk))) => {
                    // Playback drops the receiver when it is skipping.
                    let _ = chunk_tx.send(chunk);
                }
                Ok(Some(Err(err))) => {
                    stats.failures += 1;
                    tracing::warn!(agent = %label, provider = synthesizer.name(), kind = err.kind(), error = %err, "audio stream broke off");
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    stats.failures += 1;
                    tracing::warn!(agent = %label, provider = synthesizer.name(), ?stall_timeout, "audio stream stalled; abandoning line");
                    break;
                }
            }
        }
    }

    stats
}
