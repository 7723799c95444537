//! slack-llm-bot: entry point. Parses the CLI, loads config and runs the webhook.

use anyhow::Result;
use clap::Parser;
use slack_llm_bot::{run_bot, BotConfig, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token, listen } => {
            let config = BotConfig::load(token)?.with_listen_addr(listen);
            run_bot(config).await
        }
    }
}
