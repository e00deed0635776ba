//! Local speaker output through rodio.
//!
//! The output stream lives on its own thread for the lifetime of the
//! device; sessions get a `Sink` each, mixed into that stream.

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::mixer::Mixer;
use rodio::{OutputStreamBuilder, Sink};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::{AudioChannel, AudioChunk, AudioError, PlaybackDevice, SampleDecoder};

const DRAIN_POLL: Duration = Duration::from_millis(20);

pub struct RodioDevice {
    mixer: Mixer,
    volume: f32,
    // Dropping the sender lets the output thread close the stream.
    _shutdown: Mutex<mpsc::Sender<()>>,
}

impl RodioDevice {
    pub fn open(volume: f32) -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<Mixer, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStreamBuilder::open_default_stream() {
                Ok(mut stream) => {
                    stream.log_on_drop(false);
                    if ready_tx.send(Ok(stream.mixer().clone())).is_err() {
                        return;
                    }
                    // Blocks until every sender is gone.
                    while shutdown_rx.recv().is_ok() {}
                    tracing::debug!("closing audio output stream");
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                }
            })
            .map_err(|err| AudioError::Device(format!("spawn audio thread: {err}")))?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| AudioError::Unavailable("audio thread exited".to_string()))?
            .map_err(AudioError::Unavailable)?;

        Ok(Self {
            mixer,
            volume,
            _shutdown: Mutex::new(shutdown_tx),
        })
    }
}

impl PlaybackDevice for RodioDevice {
    fn open_channel(&self, label: &str) -> Result<Box<dyn AudioChannel>, AudioError> {
        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.volume);
        tracing::debug!(agent = %label, "opened audio channel");
        Ok(Box::new(RodioChannel {
            sink,
            decoder: SampleDecoder::new(),
        }))
    }
}

struct RodioChannel {
    sink: Sink,
    decoder: SampleDecoder,
}

#[async_trait]
impl AudioChannel for RodioChannel {
    fn write(&mut self, chunk: &AudioChunk) -> Result<(), AudioError> {
        if chunk.format.channels == 0 || chunk.format.sample_rate == 0 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{} channels at {} Hz",
                chunk.format.channels, chunk.format.sample_rate
            )));
        }

        let samples = self.decoder.decode(chunk);
        if samples.is_empty() {
            return Ok(());
        }

        self.sink.append(SamplesBuffer::new(
            chunk.format.channels,
            chunk.format.sample_rate,
            samples,
        ));
        Ok(())
    }

    async fn drain(&mut self) -> Result<(), AudioError> {
        while !self.sink.empty() {
            tokio::time::sleep(DRAIN_POLL).await;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

impl Drop for RodioChannel {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
