//! CLI for the slack-llm-bot binary.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser)]
#[command(name = "slack-llm-bot")]
#[command(about = "Slack bot that answers @mentions with streamed LLM replies in the thread")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the Slack Events API webhook.
    Run {
        /// Bot token. If omitted, SLACK_BOT_TOKEN from env is used.
        #[arg(short, long)]
        token: Option<String>,

        /// Bind address for the webhook. If omitted, LISTEN_ADDR from env (default 0.0.0.0:3000).
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
}
