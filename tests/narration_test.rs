use agent_narrator::config::NarrationConfig;
use agent_narrator::events::Event;
use agent_narrator::narration::history::RecentHistory;
use agent_narrator::narration::personality::{self, Personality, COMPETITORS, STREAMERS};
use agent_narrator::narration::text::{clean_markdown, speakable, truncate_for_speech};
use agent_narrator::narration::{Cue, Narrator, Speed};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

static BLANK: Personality = Personality {
    name: "Blank",
    voice_id: "voice-blank",
    color: "",
    approach: None,
    intro: &[],
    actions: &[],
    thinking: &[],
    success: &[],
    error: &[],
    frustrated: &[],
    hype: &[],
    outro: &[],
    trash_talk: &[],
    victory: &[],
};

fn narrator(profile: &'static Personality, settings: NarrationConfig) -> Narrator {
    Narrator::new(profile, &settings, StdRng::seed_from_u64(42))
}

#[test]
fn tool_use_uses_profile_template() {
    let hype_beast = &STREAMERS[0];
    let mut n = narrator(hype_beast, NarrationConfig::default());

    let line = n.narrate(&Event::tool("Write", json!({"file_path": "a.py"}))).unwrap();
    assert_eq!(line.cue, Cue::Action);
    assert!(hype_beast.action_phrases("Write").unwrap().contains(&line.text.as_str()));

    let request = n.request(line);
    assert_eq!(request.speed, Some(Speed::Fast));
    assert_eq!(request.voice_id, hype_beast.voice_id);
}

#[test]
fn unknown_tool_falls_back_to_generic_phrase() {
    let mut n = narrator(&STREAMERS[1], NarrationConfig::default());
    let line = n.narrate(&Event::tool("WebFetch", json!({}))).unwrap();
    assert_eq!(line.text, "Using WebFetch...");

    let line = n.narrate(&Event::tool("", json!({}))).unwrap();
    assert_eq!(line.text, Cue::Action.neutral_phrase());
}

#[test]
fn empty_profile_degrades_to_neutral_phrases() {
    let mut n = narrator(&BLANK, NarrationConfig::default());
    assert_eq!(n.filler().text, Cue::Filler.neutral_phrase());
    assert_eq!(n.intro().text, Cue::Intro.neutral_phrase());
    assert_eq!(
        n.narrate(&Event::error("boom")).unwrap().text,
        Cue::Error.neutral_phrase()
    );
    let outro = n
        .narrate(&Event::Completion {
            is_error: false,
            result: None,
            session_id: None,
        })
        .unwrap();
    assert_eq!(outro.text, Cue::Outro.neutral_phrase());
    assert_eq!(n.trash_talk("Rival").text, "Let's see what Rival comes up with.");
}

#[test]
fn assistant_text_is_spoken_cleaned() {
    let mut n = narrator(&STREAMERS[2], NarrationConfig::default());
    let line = n.narrate(&Event::text("**Great** news: the tests pass.")).unwrap();
    assert_eq!(line.cue, Cue::Narration);
    assert_eq!(line.text, "Great news: the tests pass.");

    assert!(n.narrate(&Event::text("```\nfn main() {}\n```")).is_none());
}

#[test]
fn successful_tool_results_hype_periodically() {
    let settings = NarrationConfig {
        hype_every: 2,
        ..NarrationConfig::default()
    };
    let mut n = narrator(&STREAMERS[0], settings);
    let ok = Event::ToolResult {
        tool_use_id: None,
        is_error: false,
        content: None,
    };
    let failed = Event::ToolResult {
        tool_use_id: None,
        is_error: true,
        content: None,
    };

    assert!(n.narrate(&ok).is_none());
    assert!(n.narrate(&failed).is_none());
    assert_eq!(n.narrate(&ok).map(|l| l.cue), Some(Cue::Hype));
    assert!(n.narrate(&ok).is_none());
}

#[test]
fn clean_tool_result_after_a_failure_gets_a_success_line() {
    let settings = NarrationConfig {
        hype_every: 0,
        ..NarrationConfig::default()
    };
    let profile = &STREAMERS[1];
    let mut n = narrator(profile, settings);
    let ok = Event::ToolResult {
        tool_use_id: None,
        is_error: false,
        content: None,
    };
    let failed = Event::ToolResult {
        tool_use_id: None,
        is_error: true,
        content: None,
    };

    assert!(n.narrate(&ok).is_none());
    assert!(n.narrate(&failed).is_none());
    let line = n.narrate(&ok).unwrap();
    assert_eq!(line.cue, Cue::Success);
    assert!(profile.success.contains(&line.text.as_str()));
    assert!(n.narrate(&ok).is_none());

    n.narrate(&Event::error("boom")).unwrap();
    assert_eq!(n.narrate(&ok).map(|l| l.cue), Some(Cue::Success));

    let mut blank = narrator(&BLANK, NarrationConfig::default());
    blank.narrate(&failed);
    assert_eq!(blank.narrate(&ok).unwrap().text, Cue::Success.neutral_phrase());
}

#[test]
fn repeated_errors_escalate_until_clean_completion() {
    let settings = NarrationConfig {
        frustrated_after: 2,
        ..NarrationConfig::default()
    };
    let mut n = narrator(&STREAMERS[2], settings);
    let error = Event::error("failed");

    assert_eq!(n.narrate(&error).unwrap().cue, Cue::Error);
    assert_eq!(n.narrate(&error).unwrap().cue, Cue::Error);
    assert_eq!(n.narrate(&error).unwrap().cue, Cue::Frustrated);

    let done = Event::Completion {
        is_error: false,
        result: None,
        session_id: None,
    };
    assert_eq!(n.narrate(&done).unwrap().cue, Cue::Outro);
    assert_eq!(n.narrate(&error).unwrap().cue, Cue::Error);
}

#[test]
fn fillers_never_repeat_back_to_back() {
    for profile in personality::all() {
        let mut n = narrator(profile, NarrationConfig::default());
        let mut previous = n.filler().text;
        for _ in 0..200 {
            let next = n.filler().text;
            assert_ne!(next, previous, "{} repeated a filler", profile.name);
            previous = next;
        }
    }
}

#[test]
fn history_handles_tiny_pools() {
    static PAIR: &[&str] = &["one", "two"];
    static SINGLE: &[&str] = &["only"];
    let mut rng = StdRng::seed_from_u64(1);

    let mut history = RecentHistory::new(3);
    let mut last = history.pick(PAIR, &mut rng).unwrap();
    for _ in 0..50 {
        let next = history.pick(PAIR, &mut rng).unwrap();
        assert_ne!(next, last);
        last = next;
    }

    let mut history = RecentHistory::new(3);
    assert_eq!(history.pick(SINGLE, &mut rng), Some("only"));
    assert_eq!(history.pick(SINGLE, &mut rng), Some("only"));
    assert_eq!(history.pick(&[], &mut rng), None);
}

#[test]
fn trash_talk_names_the_opponent() {
    let mut n = narrator(&COMPETITORS[0], NarrationConfig::default());
    let line = n.trash_talk("Architect");
    assert_eq!(line.cue, Cue::TrashTalk);
    assert!(line.text.contains("Architect"));
    assert!(!line.text.contains("{opponent}"));
}

#[test]
fn personalities_are_found_by_loose_name() {
    assert_eq!(personality::find("hype beast").unwrap().name, "The Hype Beast");
    assert_eq!(personality::find("The Chill Streamer").unwrap().name, "The Chill Streamer");
    assert_eq!(personality::find("speeddemon").unwrap().name, "SpeedDemon");
    assert!(personality::find("nobody").is_none());
    assert_eq!(personality::all().count(), 7);
    assert!(COMPETITORS.iter().all(|c| c.approach.is_some()));
}

#[test]
fn seeded_choice_is_reproducible() {
    let a = personality::choose(&mut StdRng::seed_from_u64(9));
    let b = personality::choose(&mut StdRng::seed_from_u64(9));
    assert_eq!(a.name, b.name);
}

#[test]
fn speakable_filters_code_data_and_paths() {
    assert!(speakable("```rust\nfn main() {}\n```", 300).is_none());
    assert!(speakable(r#"{"ok": true}"#, 300).is_none());
    assert!(speakable("src/narration/mod.rs", 300).is_none());
    assert!(speakable("$$$ ### !!! %%% &&&", 300).is_none());
    assert!(speakable("   ", 300).is_none());
    assert_eq!(
        speakable("Here is the fix:\n```\nx = 1\n```\nDone now.", 300).as_deref(),
        Some("Here is the fix: Done now.")
    );
}

#[test]
fn markdown_is_stripped() {
    assert_eq!(
        clean_markdown("## Plan\n- read `config.rs`\n- fix *the* bug\n1. ship it"),
        "Plan read config.rs fix the bug ship it"
    );
}

#[test]
fn truncation_prefers_sentence_breaks() {
    let text = format!("{}. {}", "a".repeat(150), "b".repeat(300));
    let cut = truncate_for_speech(&text, 300);
    assert_eq!(cut, format!("{}.", "a".repeat(150)));

    let words = "word ".repeat(100);
    let cut = truncate_for_speech(words.trim(), 50);
    assert_eq!(cut.chars().count(), 50);
    assert!(cut.ends_with("..."));

    assert_eq!(truncate_for_speech("short", 50), "short");
}
