//! Wiring: history store, Slack client, LLM client, handler, then the webhook until Ctrl-C.

use crate::config::BotConfig;
use crate::handler::{MentionHandler, ReplySettings};
use crate::webhook;
use anyhow::Result;
use history::{HistoryStore, InMemoryHistoryStore, RedisHistoryStore};
use llm_client::{LlmClient, OpenAILlmClient};
use openai_client::mask_token;
use slackbot_core::{init_tracing, ConversationSink, SlackWebClient};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Redis when `REDIS_URL` is set, otherwise a process-local store with the same expiry.
pub async fn create_history_store(config: &BotConfig) -> Result<Arc<dyn HistoryStore>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let store =
                RedisHistoryStore::connect(url, config.history_namespace.as_str(), config.history_ttl)
                    .await?;
            info!(
                namespace = %config.history_namespace,
                ttl_secs = config.history_ttl.as_secs(),
                "Using Redis history store"
            );
            Ok(Arc::new(store))
        }
        None => {
            warn!("REDIS_URL not set; history is kept in memory and lost on restart");
            Ok(Arc::new(InMemoryHistoryStore::new(config.history_ttl)))
        }
    }
}

/// Builds the handler from config and pre-built collaborators (also used by tests).
pub fn build_handler(
    config: &BotConfig,
    sink: Arc<dyn ConversationSink>,
    history: Arc<dyn HistoryStore>,
    llm_client: Arc<dyn LlmClient>,
) -> MentionHandler {
    MentionHandler::new(sink, history, llm_client, ReplySettings::from(config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Main entry: init logging, build components, then serve the Events API webhook.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    init_tracing(&config.log_file)?;

    info!(
        listen_addr = %config.listen_addr,
        model = %config.llm.model,
        streaming = config.use_streaming,
        slack_token = %mask_token(&config.slack_bot_token),
        "Initializing bot"
    );

    let history = create_history_store(&config).await?;
    let sink: Arc<dyn ConversationSink> = Arc::new(SlackWebClient::with_api_base(
        config.slack_bot_token.clone(),
        config.slack_api_url.clone(),
    ));
    let llm_client: Arc<dyn LlmClient> = Arc::new(OpenAILlmClient::from_config(&config.llm));
    let handler = Arc::new(build_handler(&config, sink, history, llm_client));

    info!("Bot started successfully");
    webhook::serve(config.listen_addr, handler, shutdown_signal()).await?;
    Ok(())
}
