use crate::events::Event;
use anyhow::Context;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use super::claude::StreamDecoder;

/// Lazy, finite sequence of events read from a running agent process.
///
/// Dropping the source kills the process; `cancel` does the same and waits
/// for it to be reaped.
pub struct EventSource {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    decoder: StreamDecoder,
    pending: VecDeque<Event>,
    finished: bool,
    malformed: usize,
}

impl EventSource {
    pub fn spawn(mut cmd: Command) -> anyhow::Result<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().context("spawn agent process")?;
        let stdout = child.stdout.take().context("capture agent stdout")?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(line = %line, "agent stderr");
                }
            });
        }

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            decoder: StreamDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
            malformed: 0,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Number of output lines skipped because they failed to decode.
    pub fn malformed_lines(&self) -> usize {
        self.malformed
    }

    /// Next event, or `None` once the process has exited and all of its
    /// output has been consumed. A non-zero exit status is reported as a
    /// final `Error` event. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }

            match self.lines.next_line().await {
                Ok(Some(line)) => match self.decoder.decode_line(&line) {
                    Ok(events) => self.pending.extend(events),
                    Err(err) => {
                        self.malformed += 1;
                        tracing::warn!(error = %err, "skipping malformed agent output line");
                    }
                },
                Ok(None) => {
                    self.pending.extend(self.decoder.finish());
                    self.finish_process().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "agent stdout read failed");
                    self.pending.extend(self.decoder.finish());
                    self.finish_process().await;
                }
            }
        }
    }

    /// Terminates the process and waits for it to exit.
    pub async fn cancel(mut self) {
        if let Err(err) = self.child.kill().await {
            tracing::debug!(error = %err, "agent process already gone");
        }
    }

    async fn finish_process(&mut self) {
        match self.child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                self.pending
                    .push_back(Event::error(format!("agent exited with {status}")));
            }
            Err(err) => {
                self.pending
                    .push_back(Event::error(format!("failed to wait for agent: {err}")));
            }
        }
        self.finished = true;
    }
}
