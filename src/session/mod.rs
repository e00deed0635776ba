//! One narrated agent run: event source, narrator, synthesis and playback.

pub mod voice;

use crate::adapters::{AgentCommand, EventSource};
use crate::audio::player::OutputFloor;
use crate::audio::PlaybackDevice;
use crate::config::{AgentConfig, NarrationConfig};
use crate::events::Event;
use crate::narration::personality::{self, Personality};
use crate::narration::{Line, NarrationRequest, Narrator};
use crate::tts::Synthesizer;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub use voice::{Voice, VoiceReport};

/// Everything a session borrows from the process that runs it.
#[derive(Clone)]
pub struct SessionContext {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub device: Arc<dyn PlaybackDevice>,
    pub narration: NarrationConfig,
    pub agent: AgentConfig,
    /// Shared when several sessions play through one physical output.
    pub floor: Option<OutputFloor>,
    /// How long a synthesis stream may stay silent before its line is
    /// abandoned.
    pub stall_timeout: Duration,
    pub cancel: CancellationToken,
    pub seed: Option<u64>,
}

impl SessionContext {
    /// Random source for one session. With a seed, `salt` keeps sessions
    /// started from the same context apart while staying reproducible.
    pub fn rng(&self, salt: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt)),
            None => StdRng::from_entropy(),
        }
    }

    /// A fresh narrator for `personality`, or for a seeded pick among the
    /// streamers when none is given.
    pub fn narrator(&self, personality: Option<&'static Personality>, salt: u64) -> Narrator {
        let mut rng = self.rng(salt);
        let profile = personality.unwrap_or_else(|| personality::choose(&mut rng));
        Narrator::new(profile, &self.narration, rng)
    }

    pub fn voice(&self, label: &str) -> Voice {
        Voice::start(
            self.synthesizer.clone(),
            self.device.clone(),
            label.to_string(),
            self.floor.clone(),
            self.stall_timeout,
            self.cancel.clone(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub working_dir: Option<PathBuf>,
    /// Agent conversation to continue.
    pub resume: Option<String>,
    /// Rival names for trash talk. Empty outside battles.
    pub opponents: Vec<String>,
    pub announce_intro: bool,
    /// Overrides `agent.skip_permissions` from config.
    pub skip_permissions: Option<bool>,
    pub salt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Failed(String),
    Cancelled,
}

impl SessionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub agent: String,
    pub status: SessionStatus,
    /// Conversation id reported by the agent, for `--resume`.
    pub session_id: Option<String>,
    pub events: usize,
    pub malformed_lines: usize,
    pub narrated: usize,
    pub voice: VoiceReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Runs one agent to completion, narrating as it goes.
///
/// The personality is drawn from the streamer set when none is given. A
/// session never fails its caller: launch errors, synthesis errors and
/// device errors all end up in the report.
pub async fn run_session(
    ctx: &SessionContext,
    prompt: &str,
    personality: Option<&'static Personality>,
    options: SessionOptions,
) -> SessionReport {
    let mut narrator = ctx.narrator(personality, options.salt);
    run_turn(ctx, prompt, &mut narrator, options).await
}

/// Like [`run_session`], but narrates with a caller-owned [`Narrator`] so
/// error streaks, hype counts and phrase history carry over between turns
/// of one conversation.
pub async fn run_turn(
    ctx: &SessionContext,
    prompt: &str,
    narrator: &mut Narrator,
    options: SessionOptions,
) -> SessionReport {
    let profile = narrator.profile();
    let started_at = Utc::now();

    let mut run = Run {
        voice: ctx.voice(profile.name),
        narrated: 0,
        events: 0,
        malformed: 0,
        session_id: None,
    };

    tracing::info!(agent = profile.name, "session starting");
    if options.announce_intro {
        let intro = narrator.intro();
        run.speak(narrator, intro);
    }

    let mut command = AgentCommand::from_config(&ctx.agent).resume(options.resume.clone());
    if let Some(skip) = options.skip_permissions {
        command = command.skip_permissions(skip);
    }
    if let Some(dir) = &options.working_dir {
        command = command.working_dir(dir);
    }

    let status = match EventSource::spawn(command.command(prompt)) {
        Ok(source) => run.drive(ctx, narrator, source, &options).await,
        Err(err) => {
            tracing::error!(agent = profile.name, error = %format!("{err:#}"), "agent failed to start");
            let reaction = narrator.error_reaction();
            run.speak(narrator, reaction);
            SessionStatus::Failed(format!("{err:#}"))
        }
    };

    let Run {
        voice,
        narrated,
        events,
        malformed,
        session_id,
    } = run;
    let voice = voice.finish().await;

    let report = SessionReport {
        agent: profile.name.to_string(),
        status,
        session_id,
        events,
        malformed_lines: malformed,
        narrated,
        voice,
        started_at,
        finished_at: Utc::now(),
    };
    tracing::info!(
        agent = profile.name,
        status = ?report.status,
        events = report.events,
        played = report.voice.played,
        "session finished"
    );
    report
}

/// Speaks fixed lines in one personality's voice, outside any agent run.
pub async fn speak_lines(
    ctx: &SessionContext,
    profile: &'static Personality,
    lines: Vec<Line>,
) -> VoiceReport {
    let voice = ctx.voice(profile.name);
    for line in lines {
        println!("{} {}", profile.tag(), line.text);
        voice.say(NarrationRequest::new(line, profile.voice_id));
    }
    voice.finish().await
}

struct Run {
    voice: Voice,
    narrated: usize,
    events: usize,
    malformed: usize,
    session_id: Option<String>,
}

enum Next {
    Event(Event),
    Idle,
    End,
    Cancelled,
}

impl Run {
    fn speak(&mut self, narrator: &Narrator, line: Line) {
        println!("{} {}", narrator.profile().tag(), line.text);
        self.narrated += 1;
        if !self.voice.say(narrator.request(line)) {
            tracing::debug!(agent = narrator.profile().name, "voice closed; line dropped");
        }
    }

    async fn drive(
        &mut self,
        ctx: &SessionContext,
        narrator: &mut Narrator,
        mut source: EventSource,
        options: &SessionOptions,
    ) -> SessionStatus {
        let agent = narrator.profile().name;
        let idle = ctx.narration.idle_threshold();
        let taunt_every = ctx.narration.trash_talk_interval();
        let mut last_taunt = Instant::now();
        let mut taunts = 0usize;
        let mut failure: Option<String> = None;

        tracing::debug!(agent, pid = ?source.id(), "agent running");

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Next::Cancelled,
                next = next_or_idle(&mut source, idle) => next,
            };

            let event = match next {
                Next::Event(event) => event,
                Next::Idle => {
                    let filler = narrator.filler();
                    self.speak(narrator, filler);
                    continue;
                }
                Next::End => break,
                Next::Cancelled => {
                    self.malformed = source.malformed_lines();
                    source.cancel().await;
                    tracing::info!(agent, "session cancelled");
                    return SessionStatus::Cancelled;
                }
            };

            self.events += 1;
            tracing::debug!(agent, kind = ?event.kind(), "{}", event.summary());

            match &event {
                Event::Error { message } => failure = Some(message.clone()),
                Event::Completion {
                    is_error,
                    result,
                    session_id,
                } => {
                    if session_id.is_some() {
                        self.session_id = session_id.clone();
                    }
                    if *is_error {
                        failure = Some(
                            result
                                .clone()
                                .unwrap_or_else(|| "agent reported an error".to_string()),
                        );
                    } else {
                        failure = None;
                    }
                }
                _ => {}
            }

            if let Some(line) = narrator.narrate(&event) {
                self.speak(narrator, line);
            }

            if let Some(every) = taunt_every {
                if !options.opponents.is_empty() && last_taunt.elapsed() >= every {
                    let opponent = &options.opponents[taunts % options.opponents.len()];
                    let taunt = narrator.trash_talk(opponent);
                    self.speak(narrator, taunt);
                    taunts += 1;
                    last_taunt = Instant::now();
                }
            }
        }

        self.malformed = source.malformed_lines();
        match failure {
            Some(reason) => SessionStatus::Failed(reason),
            None => SessionStatus::Completed,
        }
    }
}

async fn next_or_idle(source: &mut EventSource, idle: Option<Duration>) -> Next {
    let next = match idle {
        Some(limit) => match tokio::time::timeout(limit, source.next_event()).await {
            Ok(next) => next,
            Err(_) => return Next::Idle,
        },
        None => source.next_event().await,
    };
    match next {
        Some(event) => Next::Event(event),
        None => Next::End,
    }
}
