//! Mention handler: turns one `app_mention` into a prompt, a placeholder, and a relayed reply.

use crate::config::BotConfig;
use crate::mention::strip_mentions;
use crate::relay::{run_relay, RelayEvent, RelayTarget, StreamRelay, RELAY_CHANNEL_CAPACITY};
use anyhow::{Context, Result};
use history::HistoryStore;
use llm_client::{LlmClient, StreamChunk, StreamChunkCallback};
use prompt::{build_prompt, ChatMessage};
use slackbot_core::{ConversationSink, MentionEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Presentation and prompting settings shared by every reply.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub system_prompt: String,
    pub placeholder_text: String,
    pub disclaimer: String,
    pub use_streaming: bool,
}

impl From<&BotConfig> for ReplySettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            placeholder_text: config.placeholder_text.clone(),
            disclaimer: config.disclaimer_text.clone(),
            use_streaming: config.use_streaming,
        }
    }
}

/// Logs the exact messages submitted to the LLM (role + full content) for debugging.
fn log_messages_submitted_to_llm(messages: &[ChatMessage]) {
    debug!(count = messages.len(), "submit_to_llm: messages submitted to LLM");
    for (i, m) in messages.iter().enumerate() {
        debug!(
            index = i,
            role = m.role.as_str(),
            content = %m.content,
            "submit_to_llm message"
        );
    }
}

/// Handles mentions: history read, prompt, user turn recorded, placeholder posted, reply relayed.
///
/// **External interactions:** ConversationSink (post/update), HistoryStore (load/append), LlmClient (completion).
#[derive(Clone)]
pub struct MentionHandler {
    sink: Arc<dyn ConversationSink>,
    history: Arc<dyn HistoryStore>,
    llm_client: Arc<dyn LlmClient>,
    settings: ReplySettings,
}

impl MentionHandler {
    pub fn new(
        sink: Arc<dyn ConversationSink>,
        history: Arc<dyn HistoryStore>,
        llm_client: Arc<dyn LlmClient>,
        settings: ReplySettings,
    ) -> Self {
        Self {
            sink,
            history,
            llm_client,
            settings,
        }
    }

    /// Runs one mention to completion. Errors are terminal to this reply only.
    #[instrument(skip(self, event), fields(channel = %event.channel, conversation_key = %event.conversation_key()))]
    pub async fn handle(&self, event: MentionEvent) -> Result<()> {
        let key = event.conversation_key();
        let question = strip_mentions(&event.text);
        info!(
            user = ?event.user,
            question_len = question.len(),
            "Processing mention"
        );
        debug!(question = %question, "Mention text");

        let prior = match self.history.load(&key).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "History unavailable; answering without prior context");
                Vec::new()
            }
        };
        let messages = build_prompt(
            &self.settings.system_prompt,
            prior.into_iter().map(ChatMessage::from),
            &question,
        );

        if let Err(e) = self.history.append_user(&key, &question).await {
            error!(error = %e, "Failed to record user message");
        }

        let message_ts = self
            .sink
            .post_message(&event.channel, key.thread_ts(), &self.settings.placeholder_text)
            .await
            .context("failed to post placeholder message")?;
        debug!(message_ts = %message_ts, "Placeholder posted");

        let relay = StreamRelay::new(
            self.sink.clone(),
            self.history.clone(),
            RelayTarget {
                channel: event.channel.clone(),
                message_ts,
                conversation_key: key,
            },
            self.settings.disclaimer.as_str(),
        );

        info!(
            message_count = messages.len(),
            streaming = self.settings.use_streaming,
            "Submitting to LLM"
        );
        log_messages_submitted_to_llm(&messages);

        if self.settings.use_streaming {
            self.process_streaming(relay, messages).await
        } else {
            self.process_normal(relay, messages).await
        }
    }

    /// One completion call; the placeholder is replaced once by the rendered reply.
    async fn process_normal(&self, relay: StreamRelay, messages: Vec<ChatMessage>) -> Result<()> {
        match self.llm_client.get_llm_response_with_messages(messages).await {
            Ok(reply) => relay.on_stream_end(&reply).await?,
            Err(e) => relay.on_stream_error(&format!("{e:#}")).await?,
        }
        Ok(())
    }

    /// Streams fragments through a channel into a relay task that owns all edits for this reply.
    async fn process_streaming(&self, relay: StreamRelay, messages: Vec<ChatMessage>) -> Result<()> {
        let (tx, rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        let relay_task = tokio::spawn(run_relay(relay, rx));

        let fragment_tx = tx.clone();
        let mut stream_callback: Box<StreamChunkCallback> = Box::new(move |chunk: StreamChunk| {
            let tx = fragment_tx.clone();
            Box::pin(async move {
                tx.send(RelayEvent::Fragment(chunk.content))
                    .await
                    .map_err(|_| anyhow::anyhow!("relay stopped before the stream finished"))
            })
        });

        let outcome = self
            .llm_client
            .get_llm_response_stream_with_messages(messages, stream_callback.as_mut())
            .await;
        drop(stream_callback);

        let last = match outcome {
            Ok(full_response) => RelayEvent::End(full_response),
            Err(e) => {
                for (i, cause) in e.chain().enumerate() {
                    if i == 0 {
                        error!(cause = %cause, "LLM stream response failed");
                    } else {
                        error!(cause = %cause, "Caused by");
                    }
                }
                RelayEvent::Error(format!("{e:#}"))
            }
        };
        if tx.send(last).await.is_err() {
            warn!("Relay finished before the final event was delivered");
        }
        drop(tx);

        relay_task.await.context("relay task panicked")??;
        Ok(())
    }
}
