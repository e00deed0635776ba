//! Battle mode: the three competitors take the same task at once, each in
//! its own working directory, then trade victory lines and critiques.

pub mod review;

use crate::narration::personality::{Personality, COMPETITORS};
use crate::narration::{Cue, Line, Narrator};
use crate::session::{self, SessionContext, SessionOptions, SessionReport, VoiceReport};
use crate::system;
use anyhow::Context;
use rand::seq::SliceRandom;
use review::SiteAnalysis;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinSet;

const RESULT_PAGE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct BattleOptions {
    pub arena_dir: PathBuf,
    pub stagger: Duration,
    pub open_results: bool,
    pub commentary: bool,
    pub skip_permissions: bool,
}

/// One competitor's entry: who, where, and what it was asked to do.
#[derive(Debug, Clone)]
pub struct Competitor {
    pub profile: &'static Personality,
    pub work_dir: PathBuf,
    pub prompt: String,
}

impl Competitor {
    pub fn result_page(&self) -> Option<PathBuf> {
        let page = self.work_dir.join(RESULT_PAGE);
        page.is_file().then_some(page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub task: String,
    pub sessions: Vec<SessionReport>,
    pub previews_opened: usize,
}

/// The task as one competitor sees it.
pub fn framing_prompt(task: &str, approach: &str) -> String {
    format!(
        "Create a solution for: {task}\n\n\
         Your approach should be: {approach}\n\n\
         Work in the current directory. Create any files needed.\n\
         When done, if it's a web page, save it as {RESULT_PAGE}.\n\
         Be decisive and execute quickly."
    )
}

/// Creates each competitor's working directory under `arena`.
pub fn prepare(arena: &Path, task: &str) -> anyhow::Result<Vec<Competitor>> {
    COMPETITORS
        .iter()
        .map(|profile| {
            let work_dir = arena.join(profile.name.to_lowercase());
            std::fs::create_dir_all(&work_dir)
                .with_context(|| format!("create arena dir {}", work_dir.display()))?;
            Ok::<_, anyhow::Error>(Competitor {
                profile,
                work_dir,
                prompt: framing_prompt(task, profile.approach.unwrap_or("your own approach")),
            })
        })
        .collect()
}

/// Runs every competitor to a terminal state, then the wrap-up.
///
/// Sessions share nothing but the context's output floor and cancellation
/// token; one failing never stops the others.
pub async fn run_battle(
    ctx: &SessionContext,
    task: &str,
    options: &BattleOptions,
) -> anyhow::Result<BattleReport> {
    let competitors = prepare(&options.arena_dir, task)?;

    println!("BATTLE ROYALE: 3 agents, 1 task");
    println!("Task: {task}");
    for competitor in &competitors {
        println!(
            "  {} {}",
            competitor.profile.tag(),
            competitor.profile.approach.unwrap_or_default()
        );
    }
    println!();

    let mut set = JoinSet::new();
    for (index, competitor) in competitors.iter().enumerate() {
        if index > 0 && !options.stagger.is_zero() {
            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                _ = tokio::time::sleep(options.stagger) => {}
            }
        }

        let ctx = ctx.clone();
        let prompt = competitor.prompt.clone();
        let profile = competitor.profile;
        let session_options = SessionOptions {
            working_dir: Some(competitor.work_dir.clone()),
            resume: None,
            opponents: competitors
                .iter()
                .filter(|other| other.profile.name != profile.name)
                .map(|other| other.profile.name.to_string())
                .collect(),
            announce_intro: true,
            skip_permissions: Some(options.skip_permissions),
            salt: index as u64,
        };

        tracing::info!(agent = profile.name, dir = %competitor.work_dir.display(), "competitor starting");
        set.spawn(async move {
            let report = session::run_session(&ctx, &prompt, Some(profile), session_options).await;
            (index, report)
        });
    }

    let mut finished: Vec<(usize, SessionReport)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, report)) => {
                println!(
                    "{} finished: {:?} in {:.0?}",
                    competitors[index].profile.tag(),
                    report.status,
                    report.elapsed()
                );
                finished.push((index, report));
            }
            Err(err) => tracing::error!(error = %err, "competitor task aborted"),
        }
    }
    finished.sort_by_key(|(index, _)| *index);
    let sessions: Vec<SessionReport> = finished.into_iter().map(|(_, report)| report).collect();

    let mut report = BattleReport {
        task: task.to_string(),
        sessions,
        previews_opened: 0,
    };
    if ctx.cancel.is_cancelled() {
        return Ok(report);
    }

    println!();
    println!("ALL AGENTS FINISHED");
    for (index, competitor) in competitors.iter().enumerate() {
        let mut narrator = Narrator::new(competitor.profile, &ctx.narration, ctx.rng(50 + index as u64));
        let victory = narrator.victory();
        session::speak_lines(ctx, competitor.profile, vec![victory]).await;
    }

    if options.open_results {
        report.previews_opened = open_results(&competitors);
    }

    if options.commentary && !ctx.cancel.is_cancelled() {
        commentary_round(ctx, &competitors).await;
    }

    Ok(report)
}

/// Opens each competitor's page with the platform opener. Returns how many
/// were opened.
pub fn open_results(competitors: &[Competitor]) -> usize {
    let mut opened = 0;
    for competitor in competitors {
        match competitor.result_page() {
            Some(page) => match system::open_in_browser(&page) {
                Ok(()) => {
                    println!("{} {}", competitor.profile.tag(), page.display());
                    opened += 1;
                }
                Err(err) => {
                    tracing::warn!(agent = competitor.profile.name, error = %format!("{err:#}"), "could not open result page")
                }
            },
            None => println!("{} no {RESULT_PAGE} found", competitor.profile.tag()),
        }
    }
    opened
}

/// Each page is reviewed in turn: both rivals critique it, the creator
/// defends and fires back at one of them.
pub async fn commentary_round(ctx: &SessionContext, competitors: &[Competitor]) {
    let Some(host) = competitors.first() else {
        return;
    };
    let mut rng = ctx.rng(200);

    println!();
    println!("COMMENTARY ROUND");
    for creator in competitors {
        if ctx.cancel.is_cancelled() {
            return;
        }
        let Some(page) = creator.result_page() else {
            continue;
        };
        let site = SiteAnalysis::from_file(&page);
        let name = creator.profile.name;

        session::speak_lines(ctx, host.profile, vec![commentary(review::announcement(name))]).await;

        let critics: Vec<&Competitor> = competitors
            .iter()
            .filter(|c| c.profile.name != name)
            .collect();
        for critic in &critics {
            let line = review::critique(critic.profile.name, name, &site, &mut rng);
            session::speak_lines(ctx, critic.profile, vec![commentary(line)]).await;
        }

        let mut answer = vec![commentary(review::defense(name, &site, &mut rng))];
        if let Some(target) = critics.choose(&mut rng) {
            if let Some(target_page) = target.result_page() {
                let target_site = SiteAnalysis::from_file(&target_page);
                answer.push(commentary(review::critique(
                    name,
                    target.profile.name,
                    &target_site,
                    &mut rng,
                )));
            }
        }
        session::speak_lines(ctx, creator.profile, answer).await;
    }
}

/// Speaks every competitor's intro, a taunt and a victory line without
/// launching any agent.
pub async fn demo(ctx: &SessionContext) -> Vec<VoiceReport> {
    let mut reports = Vec::new();
    for (index, profile) in COMPETITORS.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let mut narrator = Narrator::new(profile, &ctx.narration, ctx.rng(index as u64));
        let lines = vec![
            narrator.intro(),
            narrator.trash_talk("the other guys"),
            narrator.victory(),
        ];
        reports.push(session::speak_lines(ctx, profile, lines).await);
    }
    reports
}

fn commentary(text: String) -> Line {
    Line {
        cue: Cue::Commentary,
        text,
    }
}
