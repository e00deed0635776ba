use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::narration::Speed;

#[derive(Parser, Debug)]
#[command(
    name = "agent-narrator",
    version,
    about = "Narrates AI coding-agent sessions out loud, one voice per agent"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, value_name = "N", help = "Seed personality and phrase choice")]
    pub seed: Option<u64>,

    #[arg(long, global = true, help = "Synthesize but do not play audio")]
    pub mute: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one narrated agent; without a prompt, read prompts interactively.
    Narrate(NarrateArgs),
    /// Three competitors take on the same task in parallel.
    Battle(BattleArgs),
    /// List the built-in personalities.
    Personalities(PersonalitiesArgs),
    TestTts(TestTtsArgs),
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct NarrateArgs {
    #[arg(value_name = "PROMPT", help = "Initial prompt")]
    pub prompt: Vec<String>,

    #[arg(long, short, help = "Personality name (random if omitted)")]
    pub personality: Option<String>,

    #[arg(long, help = "Keep the agent's permission prompts enabled")]
    pub safe: bool,
}

#[derive(Args, Debug)]
pub struct BattleArgs {
    #[arg(
        value_name = "TASK",
        required_unless_present = "demo",
        help = "Task description"
    )]
    pub task: Vec<String>,

    #[arg(long, help = "Test the competitor voices without launching agents")]
    pub demo: bool,

    #[arg(long, help = "Do not open the result pages")]
    pub no_open: bool,

    #[arg(long, help = "Skip the commentary round")]
    pub no_commentary: bool,

    #[arg(long, help = "Keep the agents' permission prompts enabled")]
    pub safe: bool,
}

#[derive(Args, Debug)]
pub struct PersonalitiesArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TestTtsArgs {
    #[arg(long, help = "Text to synthesize")]
    pub text: Option<String>,

    #[arg(long, help = "Voice id")]
    pub voice: Option<String>,

    #[arg(long, help = "Use this personality's voice")]
    pub personality: Option<String>,

    #[arg(long, value_enum, help = "Speaking speed")]
    pub speed: Option<SpeedArg>,

    #[arg(long, value_name = "PATH", help = "Save audio to a WAV file")]
    pub output: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SpeedArg {
    Slowest,
    Slow,
    Normal,
    Fast,
    Fastest,
}

impl From<SpeedArg> for Speed {
    fn from(value: SpeedArg) -> Self {
        match value {
            SpeedArg::Slowest => Speed::Slowest,
            SpeedArg::Slow => Speed::Slow,
            SpeedArg::Normal => Speed::Normal,
            SpeedArg::Fast => Speed::Fast,
            SpeedArg::Fastest => Speed::Fastest,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long, help = "Show current config as JSON")]
    pub show: bool,

    #[arg(long, help = "Create default config file")]
    pub init: bool,

    #[arg(long, help = "Validate configuration")]
    pub validate: bool,
}
