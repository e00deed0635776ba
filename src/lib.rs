pub mod adapters;
pub mod audio;
pub mod battle;
pub mod cli;
pub mod config;
pub mod events;
pub mod narration;
pub mod session;
pub mod system;
pub mod tts;

use anyhow::Context;
use audio::device::RodioDevice;
use audio::player::OutputFloor;
use audio::{NullDevice, PlaybackDevice};
use cli::{Cli, Commands};
use config::Config;
use narration::personality::{self, Personality, COMPETITORS, STREAMERS};
use narration::{Cue, Line, NarrationRequest, Speed};
use session::{SessionContext, SessionOptions, SessionReport, SessionStatus};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tts::cartesia::CartesiaClient;
use tts::Synthesizer;

#[derive(Debug, Clone, Copy)]
struct Globals {
    seed: Option<u64>,
    mute: bool,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    setup_tracing(cli.verbose);
    let globals = Globals {
        seed: cli.seed,
        mute: cli.mute,
    };

    match cli.command {
        Commands::Narrate(args) => narrate(args, globals).await,
        Commands::Battle(args) => battle_cmd(args, globals).await,
        Commands::Personalities(args) => personalities(args),
        Commands::TestTts(args) => test_tts(args, globals).await,
        Commands::Config(args) => config_cmd(args),
    }
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("load config")?;
    config.validate().context("invalid config")?;
    Ok(config)
}

/// Checks the credential and builds the shared pieces every session uses.
/// Nothing is spawned before this succeeds.
fn session_context(
    config: &Config,
    globals: Globals,
    floor: Option<OutputFloor>,
) -> anyhow::Result<SessionContext> {
    let api_key = config.api_key()?;
    let synthesizer = CartesiaClient::new(&config.tts, api_key).context("create TTS client")?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    Ok(SessionContext {
        synthesizer: Arc::new(synthesizer),
        device: open_device(config.volume, globals.mute),
        narration: config.narration.clone(),
        agent: config.agent.clone(),
        floor,
        stall_timeout: config.tts.stream_timeout(),
        cancel,
        seed: globals.seed,
    })
}

fn open_device(volume: f32, mute: bool) -> Arc<dyn PlaybackDevice> {
    if mute {
        return Arc::new(NullDevice);
    }
    match RodioDevice::open(volume) {
        Ok(device) => Arc::new(device),
        Err(err) => {
            tracing::warn!(error = %err, "no audio output; narration will be text only");
            Arc::new(NullDevice)
        }
    }
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted; stopping");
            token.cancel();
        }
    });
}

fn find_personality(name: &str) -> anyhow::Result<&'static Personality> {
    personality::find(name).with_context(|| {
        format!("unknown personality '{name}'; run `agent-narrator personalities` to list them")
    })
}

async fn narrate(args: cli::NarrateArgs, globals: Globals) -> anyhow::Result<()> {
    let config = load_config()?;
    let ctx = session_context(&config, globals, None)?;

    let profile = match &args.personality {
        Some(name) => find_personality(name)?,
        None => personality::choose(&mut ctx.rng(u64::MAX)),
    };
    let skip_permissions = !args.safe;

    let prompt = args.prompt.join(" ");
    if !prompt.trim().is_empty() {
        let report = session::run_session(
            &ctx,
            prompt.trim(),
            Some(profile),
            SessionOptions {
                announce_intro: true,
                skip_permissions: Some(skip_permissions),
                ..SessionOptions::default()
            },
        )
        .await;
        print_report(&report);
        if let SessionStatus::Failed(reason) = &report.status {
            anyhow::bail!("agent session failed: {reason}");
        }
        return Ok(());
    }

    interactive(&ctx, profile, skip_permissions).await
}

/// Reads prompts from stdin until `quit` or end of input. Turns after the
/// first continue the agent's conversation unless `new` resets it; the
/// narrator and its streaks live as long as the conversation does.
async fn interactive(
    ctx: &SessionContext,
    profile: &'static Personality,
    skip_permissions: bool,
) -> anyhow::Result<()> {
    println!("{} is live. Type a prompt; `new` starts over, `quit` leaves.", profile.tag());

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut narrator = ctx.narrator(Some(profile), 0);
    let mut resume: Option<String> = None;
    let mut turn = 0u64;
    let mut introduced = false;

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            line = stdin.next_line() => line.context("read prompt")?,
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "new" => {
                resume = None;
                turn += 1;
                narrator = ctx.narrator(Some(profile), turn);
                println!("Starting a new conversation.");
                let fresh = Line {
                    cue: Cue::Narration,
                    text: "Fresh start, let's go!".to_string(),
                };
                session::speak_lines(ctx, profile, vec![fresh]).await;
                continue;
            }
            prompt => {
                turn += 1;
                let report = session::run_turn(
                    ctx,
                    prompt,
                    &mut narrator,
                    SessionOptions {
                        resume: resume.clone(),
                        announce_intro: !introduced,
                        skip_permissions: Some(skip_permissions),
                        ..SessionOptions::default()
                    },
                )
                .await;
                introduced = true;
                print_report(&report);
                if report.session_id.is_some() {
                    resume = report.session_id.clone();
                }
                if report.status == SessionStatus::Cancelled {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &SessionReport) {
    let tag = personality::find(&report.agent)
        .map(|p| p.tag())
        .unwrap_or_else(|| format!("[{}]", report.agent));
    let status = match &report.status {
        SessionStatus::Completed => "completed".to_string(),
        SessionStatus::Failed(reason) => format!("failed: {reason}"),
        SessionStatus::Cancelled => "cancelled".to_string(),
    };
    println!(
        "{tag} {status} after {:.1?}: {} events, {} lines spoken, {} skipped",
        report.elapsed(),
        report.events,
        report.voice.played,
        report.voice.skipped + report.voice.synthesis_failures,
    );
}

async fn battle_cmd(args: cli::BattleArgs, globals: Globals) -> anyhow::Result<()> {
    let config = load_config()?;
    let floor = config.battle.shared_output.then(OutputFloor::default);
    let ctx = session_context(&config, globals, floor)?;

    if args.demo {
        println!("VOICE DEMO: testing all competitor voices");
        let reports = battle::demo(&ctx).await;
        let failures: usize = reports.iter().map(|r| r.synthesis_failures).sum();
        if failures > 0 {
            tracing::warn!(failures, "some demo lines could not be synthesized");
        }
        println!("Voice demo complete.");
        return Ok(());
    }

    let task = args.task.join(" ");
    if task.trim().is_empty() {
        anyhow::bail!("battle needs a task description");
    }

    let options = battle::BattleOptions {
        arena_dir: config.arena_dir(),
        stagger: Duration::from_millis(config.battle.stagger_ms),
        open_results: config.battle.open_results && !args.no_open,
        commentary: config.battle.commentary && !args.no_commentary,
        skip_permissions: !args.safe,
    };
    let report = battle::run_battle(&ctx, task.trim(), &options).await?;

    for session in &report.sessions {
        print_report(session);
    }
    let completed = report
        .sessions
        .iter()
        .filter(|s| s.status.is_completed())
        .count();
    println!("{completed} of {} competitors completed the task.", report.sessions.len());
    Ok(())
}

fn personalities(args: cli::PersonalitiesArgs) -> anyhow::Result<()> {
    if args.json {
        let all: Vec<&Personality> = personality::all().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Streamers:");
    for profile in STREAMERS.iter() {
        println!("- {} (voice {})", profile.name, profile.voice_id);
    }
    println!("Battle competitors:");
    for profile in COMPETITORS.iter() {
        println!(
            "- {}: {}",
            profile.name,
            profile.approach.unwrap_or_default()
        );
    }
    Ok(())
}

async fn test_tts(args: cli::TestTtsArgs, globals: Globals) -> anyhow::Result<()> {
    let config = load_config()?;
    let client = CartesiaClient::new(&config.tts, config.api_key()?)?;

    let profile = match &args.personality {
        Some(name) => find_personality(name)?,
        None => &STREAMERS[0],
    };
    let voice_id = args.voice.unwrap_or_else(|| profile.voice_id.to_string());
    let text = args
        .text
        .unwrap_or_else(|| "Hello! This is a test of the narration voice.".to_string());
    let request = NarrationRequest::new(
        Line {
            cue: Cue::Narration,
            text,
        },
        voice_id,
    )
    .with_speed(args.speed.map(Speed::from));

    let stream = client.synthesize(&request).await.context("tts synthesis")?;
    let chunks = tts::collect(stream).await.context("tts stream")?;
    let bytes: usize = chunks.iter().map(|c| c.data.len()).sum();
    println!("Received {} chunks ({bytes} bytes)", chunks.len());

    if let Some(path) = &args.output {
        audio::wav::write_wav(path, &chunks)?;
        println!("Saved {}", path.display());
    }

    if globals.mute || chunks.is_empty() {
        return Ok(());
    }
    let device = open_device(config.volume, false);
    let mut channel = device.open_channel("test-tts")?;
    for chunk in &chunks {
        channel.write(chunk)?;
    }
    channel.drain().await?;
    Ok(())
}

fn config_cmd(args: cli::ConfigArgs) -> anyhow::Result<()> {
    if args.init {
        let path = Config::init_default()?;
        println!("Initialized config at {}", path.display());
        return Ok(());
    }

    if args.show {
        let config = Config::load()?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.validate {
        let config = Config::load()?;
        config.validate()?;
        println!("Config OK");
        return Ok(());
    }

    let path = Config::default_path()?;
    println!("{}", path.display());
    Ok(())
}
