mod common;

use agent_narrator::battle::review::{critique, defense, SiteAnalysis, SiteStyle};
use agent_narrator::battle::{self, BattleOptions};
use agent_narrator::narration::personality::COMPETITORS;
use agent_narrator::session::SessionStatus;
use common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn framing_prompt_names_task_and_approach() {
    let prompt = battle::framing_prompt("build a todo app", "fastest, minimal approach");
    assert!(prompt.starts_with("Create a solution for: build a todo app"));
    assert!(prompt.contains("Your approach should be: fastest, minimal approach"));
    assert!(prompt.contains("index.html"));
}

#[test]
fn prepare_gives_each_competitor_its_own_dir() {
    let arena = tempfile::tempdir().unwrap();
    let competitors = battle::prepare(arena.path(), "build a todo app").unwrap();

    assert_eq!(competitors.len(), 3);
    for (competitor, profile) in competitors.iter().zip(COMPETITORS.iter()) {
        assert_eq!(competitor.profile.name, profile.name);
        assert!(competitor.work_dir.is_dir());
        assert!(competitor.prompt.contains(profile.approach.unwrap()));
        assert!(competitor.result_page().is_none());
    }
    assert_eq!(competitors[0].work_dir, arena.path().join("speeddemon"));
}

#[test]
fn site_analysis_picks_up_structure() {
    let minimal = SiteAnalysis::analyze("<html><body><h1>Todo</h1></body></html>");
    assert_eq!(minimal.style, SiteStyle::Minimal);
    assert_eq!(minimal.line_count, 1);
    assert!(!minimal.has_js);

    let html = format!(
        "<!-- app -->\n<link rel=\"stylesheet\" href=\"a.css\">\n<link href=\"b.css\">\n<script src=\"c.js\"></script>\n<script src=\"d.js\"></script>\n<div style=\"x\">{}</div>",
        "\n".repeat(60)
    );
    let organized = SiteAnalysis::analyze(&html);
    assert_eq!(organized.style, SiteStyle::Organized);
    assert!(organized.has_css && organized.has_js && organized.has_comments);
    assert!(organized.uses_inline_styles);
    assert_eq!(organized.external_refs, 4);

    let missing = SiteAnalysis::from_file(std::path::Path::new("/nonexistent/index.html"));
    assert_eq!(missing.style, SiteStyle::Unknown);
}

#[test]
fn critiques_and_defenses_stay_in_character() {
    let mut rng = StdRng::seed_from_u64(3);
    let site = SiteAnalysis::analyze("<h1>hi</h1>");

    for critic in ["SpeedDemon", "Architect", "Wildcard"] {
        let line = critique(critic, "Rival", &site, &mut rng);
        assert!(!line.is_empty());
        assert!(!line.contains("{"));
    }
    let architect = critique("Architect", "Rival", &site, &mut rng);
    assert!(architect.contains("Rival"), "{architect}");

    assert_eq!(
        critique("Nobody", "Rival", &site, &mut rng),
        "Rival's work is... fine, I guess. Nothing special."
    );
    assert!(!defense("SpeedDemon", &site, &mut rng).is_empty());
    assert_eq!(defense("Nobody", &site, &mut rng), "Whatever, I like what I built!");
}

#[tokio::test]
async fn battle_runs_all_competitors_despite_a_failing_voice() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path(), &[TEXT_START, WRITE_FILE, RESULT_OK]);
    let agent = shell_agent(&format!(
        "cat '{}'; echo '<html><body>done</body></html>' > index.html",
        fixture.display()
    ));
    let synth = Arc::new(FakeSynth {
        fail_voice: Some(COMPETITORS[0].voice_id.to_string()),
        ..FakeSynth::default()
    });
    let device = Arc::new(FakeDevice::default());
    let mut ctx = context(synth.clone(), device.clone(), agent, quiet_narration());
    ctx.floor = Some(Default::default());

    let arena = tempfile::tempdir().unwrap();
    let options = BattleOptions {
        arena_dir: arena.path().to_path_buf(),
        stagger: Duration::from_millis(10),
        open_results: false,
        commentary: true,
        skip_permissions: true,
    };
    let report = battle::run_battle(&ctx, "build a todo app", &options)
        .await
        .unwrap();

    assert_eq!(report.sessions.len(), 3);
    for (session, profile) in report.sessions.iter().zip(COMPETITORS.iter()) {
        assert_eq!(session.agent, profile.name);
        assert_eq!(session.status, SessionStatus::Completed);
    }
    let completed = report
        .sessions
        .iter()
        .filter(|s| s.status.is_completed())
        .count();
    assert_eq!(completed, 3);
    assert!(!SessionStatus::Cancelled.is_completed());
    assert!(report.sessions[0].voice.synthesis_failures > 0);
    assert_eq!(report.sessions[1].voice.synthesis_failures, 0);

    let prompts: Vec<String> = synth
        .requests
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.cue == agent_narrator::narration::Cue::Commentary)
        .map(|r| r.text.clone())
        .collect();
    assert!(prompts
        .iter()
        .any(|t| t == "Alright, let's take a look at what Architect built."));
    assert!(arena.path().join("wildcard").join("index.html").is_file());
    assert_eq!(device.open(), 0);
}

#[tokio::test]
async fn demo_speaks_three_lines_per_competitor() {
    let synth = Arc::new(FakeSynth::default());
    let device = Arc::new(FakeDevice::default());
    let ctx = context(synth.clone(), device.clone(), shell_agent("exit 0"), quiet_narration());

    let reports = battle::demo(&ctx).await;

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.played == 3));
    let texts = device.texts();
    assert_eq!(texts.len(), 9);
    assert!(texts.iter().any(|t| t.contains("the other guys")));
}
