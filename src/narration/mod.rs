//! Maps agent events onto short spoken lines in a personality's voice.

pub mod history;
pub mod personality;
pub mod text;

use crate::config::NarrationConfig;
use crate::events::Event;
use history::RecentHistory;
use personality::Personality;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What prompted a line; each cue draws from its own phrase pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Intro,
    Narration,
    Action,
    Filler,
    Hype,
    Success,
    Error,
    Frustrated,
    Outro,
    TrashTalk,
    Victory,
    Commentary,
}

impl Cue {
    /// Spoken when the personality has nothing for this cue.
    pub fn neutral_phrase(self) -> &'static str {
        match self {
            Cue::Intro => "Alright, let's get started.",
            Cue::Narration | Cue::Commentary => "Okay.",
            Cue::Action => "Using a tool...",
            Cue::Filler => "Thinking...",
            Cue::Hype => "Making progress.",
            Cue::Success => "That worked.",
            Cue::Error | Cue::Frustrated => "Hmm, that didn't work. Let me try something else.",
            Cue::Outro => "All done.",
            Cue::TrashTalk => "Let's see what {opponent} comes up with.",
            Cue::Victory => "Finished!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slowest,
    Slow,
    Normal,
    Fast,
    Fastest,
}

/// A line to say, before a voice is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub cue: Cue,
    pub text: String,
}

/// Text plus voice selection for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationRequest {
    pub text: String,
    pub voice_id: String,
    pub cue: Cue,
    pub speed: Option<Speed>,
    pub emotion: Vec<String>,
}

impl NarrationRequest {
    pub fn new(line: Line, voice_id: impl Into<String>) -> Self {
        let speed = match line.cue {
            Cue::Action => Some(Speed::Fast),
            _ => None,
        };
        Self {
            text: line.text,
            voice_id: voice_id.into(),
            cue: line.cue,
            speed,
            emotion: Vec::new(),
        }
    }

    pub fn with_speed(mut self, speed: Option<Speed>) -> Self {
        self.speed = speed;
        self
    }
}

/// Per-session narration state: one personality, its phrase history, and a
/// seeded random source.
pub struct Narrator {
    profile: &'static Personality,
    rng: StdRng,
    window: usize,
    history: HashMap<Cue, RecentHistory>,
    max_chars: usize,
    hype_every: usize,
    frustrated_after: usize,
    tool_successes: usize,
    consecutive_errors: usize,
    /// Set by a failure; the next clean tool result is celebrated.
    recovering: bool,
}

impl Narrator {
    pub fn new(profile: &'static Personality, settings: &NarrationConfig, rng: StdRng) -> Self {
        Self {
            profile,
            rng,
            window: settings.history_window.max(1),
            history: HashMap::new(),
            max_chars: settings.max_chars,
            hype_every: settings.hype_every,
            frustrated_after: settings.frustrated_after,
            tool_successes: 0,
            consecutive_errors: 0,
            recovering: false,
        }
    }

    pub fn profile(&self) -> &'static Personality {
        self.profile
    }

    /// Zero or one line for `event`. Never fails: gaps in the profile fall
    /// back to neutral phrasing.
    pub fn narrate(&mut self, event: &Event) -> Option<Line> {
        match event {
            Event::AssistantMessage { text: body } => {
                text::speakable(body, self.max_chars).map(|text| Line {
                    cue: Cue::Narration,
                    text,
                })
            }
            Event::ToolUse { name, .. } => Some(self.action(name)),
            Event::ToolResult { is_error, .. } => {
                if *is_error {
                    self.recovering = true;
                    return None;
                }
                self.tool_successes += 1;
                if self.hype_every > 0 && self.tool_successes % self.hype_every == 0 {
                    self.recovering = false;
                    Some(self.hype())
                } else if std::mem::take(&mut self.recovering) {
                    Some(self.success())
                } else {
                    None
                }
            }
            Event::Error { .. } | Event::Completion { is_error: true, .. } => {
                Some(self.error_reaction())
            }
            Event::Completion { is_error: false, .. } => {
                self.consecutive_errors = 0;
                self.recovering = false;
                Some(self.outro())
            }
        }
    }

    pub fn intro(&mut self) -> Line {
        self.line(Cue::Intro, self.profile.intro)
    }

    pub fn filler(&mut self) -> Line {
        self.line(Cue::Filler, self.profile.thinking)
    }

    pub fn hype(&mut self) -> Line {
        self.line(Cue::Hype, self.profile.hype)
    }

    pub fn success(&mut self) -> Line {
        self.line(Cue::Success, self.profile.success)
    }

    pub fn outro(&mut self) -> Line {
        self.line(Cue::Outro, self.profile.outro)
    }

    pub fn victory(&mut self) -> Line {
        self.line(Cue::Victory, self.profile.victory)
    }

    pub fn trash_talk(&mut self, opponent: &str) -> Line {
        let line = self.line(Cue::TrashTalk, self.profile.trash_talk);
        Line {
            cue: line.cue,
            text: line.text.replace("{opponent}", opponent),
        }
    }

    pub fn action(&mut self, tool: &str) -> Line {
        match self.profile.action_phrases(tool) {
            Some(pool) => self.line(Cue::Action, pool),
            None if tool.trim().is_empty() => Line {
                cue: Cue::Action,
                text: Cue::Action.neutral_phrase().to_string(),
            },
            None => Line {
                cue: Cue::Action,
                text: format!("Using {tool}..."),
            },
        }
    }

    pub fn error_reaction(&mut self) -> Line {
        self.consecutive_errors += 1;
        self.recovering = true;
        if self.consecutive_errors > self.frustrated_after && !self.profile.frustrated.is_empty() {
            self.line(Cue::Frustrated, self.profile.frustrated)
        } else {
            self.line(Cue::Error, self.profile.error)
        }
    }

    /// Attaches this narrator's voice to a line.
    pub fn request(&self, line: Line) -> NarrationRequest {
        NarrationRequest::new(line, self.profile.voice_id)
    }

    fn line(&mut self, cue: Cue, pool: &'static [&'static str]) -> Line {
        let window = self.window;
        let history = self
            .history
            .entry(cue)
            .or_insert_with(|| RecentHistory::new(window));
        let text = history
            .pick(pool, &mut self.rng)
            .unwrap_or_else(|| cue.neutral_phrase());
        Line {
            cue,
            text: text.to_string(),
        }
    }
}
