use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = agent_narrator::cli::Cli::parse();
    agent_narrator::run(cli).await
}
