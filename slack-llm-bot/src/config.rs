//! BotConfig: Slack connection, webhook, history store, reply presentation and LLM settings. Loaded from env.

use anyhow::{Context, Result};
use history::{DEFAULT_HISTORY_NAMESPACE, DEFAULT_HISTORY_TTL_SECS};
use llm_client::EnvLlmConfig;
use slackbot_core::{SlackbotError, SLACK_API_BASE};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::render::DEFAULT_DISCLAIMER;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PLACEHOLDER_TEXT: &str = "Typing...";
pub const DEFAULT_LOG_FILE: &str = "logs/slack-llm-bot.log";

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// SLACK_BOT_TOKEN
    pub slack_bot_token: String,
    /// SLACK_API_URL
    pub slack_api_url: String,
    /// LISTEN_ADDR: Events API webhook bind address
    pub listen_addr: SocketAddr,
    /// USE_STREAMING: relay fragments as they arrive, or replace the placeholder once
    pub use_streaming: bool,
    /// SYSTEM_PROMPT
    pub system_prompt: String,
    /// REDIS_URL; `None` keeps history in process memory
    pub redis_url: Option<String>,
    /// HISTORY_NAMESPACE
    pub history_namespace: String,
    /// HISTORY_TTL_SECS
    pub history_ttl: Duration,
    /// PLACEHOLDER_TEXT
    pub placeholder_text: String,
    /// DISCLAIMER_TEXT
    pub disclaimer_text: String,
    /// LOG_FILE
    pub log_file: String,
    pub llm: EnvLlmConfig,
}

/// Reads `name`, parsing it when set; unparsable values are errors rather than defaults.
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            SlackbotError::Config(format!("{name} has invalid value {raw:?}: {e}")).into()
        }),
        Err(_) => Ok(default),
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl BotConfig {
    /// Load from environment variables. `token` overrides SLACK_BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let slack_bot_token = match token {
            Some(t) => t,
            None => env::var("SLACK_BOT_TOKEN").context("SLACK_BOT_TOKEN not set")?,
        };
        let listen_addr = env_parse(
            "LISTEN_ADDR",
            SocketAddr::from_str(DEFAULT_LISTEN_ADDR).context("default listen address")?,
        )?;
        let history_ttl_secs: u64 = env_parse("HISTORY_TTL_SECS", DEFAULT_HISTORY_TTL_SECS)?;
        if history_ttl_secs == 0 {
            return Err(SlackbotError::Config("HISTORY_TTL_SECS must be positive".to_string()).into());
        }
        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            slack_bot_token,
            slack_api_url: env_or("SLACK_API_URL", SLACK_API_BASE),
            listen_addr,
            use_streaming: env_parse("USE_STREAMING", true)?,
            system_prompt: env_or("SYSTEM_PROMPT", prompt::DEFAULT_SYSTEM_MESSAGE),
            redis_url,
            history_namespace: env_or("HISTORY_NAMESPACE", DEFAULT_HISTORY_NAMESPACE),
            history_ttl: Duration::from_secs(history_ttl_secs),
            placeholder_text: env_or("PLACEHOLDER_TEXT", DEFAULT_PLACEHOLDER_TEXT),
            disclaimer_text: env_or("DISCLAIMER_TEXT", DEFAULT_DISCLAIMER),
            log_file: env_or("LOG_FILE", DEFAULT_LOG_FILE),
            llm: EnvLlmConfig::from_env()?,
        })
    }

    /// Overrides the webhook bind address (CLI `--listen`).
    pub fn with_listen_addr(mut self, addr: Option<SocketAddr>) -> Self {
        if let Some(addr) = addr {
            self.listen_addr = addr;
        }
        self
    }
}
