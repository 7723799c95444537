//! Streaming relay: turns completion fragments into rate-limited edits of one placeholder message,
//! then writes the rendered reply and records it in history.
//!
//! # Entry points
//!
//! - **[`StreamRelay`]**: owns one [`StreamState`]; `on_fragment` per fragment, then exactly one of
//!   `on_stream_end` / `on_stream_error` (both consume the relay).
//! - **[`run_relay`]**: single-consumer loop over a [`RelayEvent`] channel, so fragments for one
//!   response are applied strictly in order and updates never overtake each other.

mod state;

pub use state::{StreamState, INITIAL_FLUSH_INTERVAL, IN_PROGRESS_SUFFIX, UPDATES_PER_BACKOFF_CHECK};

use crate::render::{failure_notice, RenderedMessage};
use history::HistoryStore;
use slackbot_core::{Channel, ConversationKey, ConversationSink, MessageContent, SlackbotError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Attempts for the closing write when Slack answers with a rate limit.
pub const FINAL_UPDATE_ATTEMPTS: u32 = 3;
/// Capacity of the fragment channel between the completion callback and the relay task.
pub const RELAY_CHANNEL_CAPACITY: usize = 64;

/// The placeholder message a relay edits, and the thread whose history it completes.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub channel: Channel,
    pub message_ts: String,
    pub conversation_key: ConversationKey,
}

/// Input to [`run_relay`].
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Fragment(String),
    /// Stream finished; carries the full reply text.
    End(String),
    /// Stream failed; carries the error description.
    Error(String),
}

pub struct StreamRelay {
    sink: Arc<dyn ConversationSink>,
    history: Arc<dyn HistoryStore>,
    target: RelayTarget,
    disclaimer: String,
    state: StreamState,
}

impl StreamRelay {
    pub fn new(
        sink: Arc<dyn ConversationSink>,
        history: Arc<dyn HistoryStore>,
        target: RelayTarget,
        disclaimer: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            history,
            target,
            disclaimer: disclaimer.into(),
            state: StreamState::new(Instant::now()),
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Appends `fragment`; edits the placeholder with the buffer and [`IN_PROGRESS_SUFFIX`] when the interval has passed.
    ///
    /// A rejected edit is logged and not retried here; the next due flush carries the newer buffer.
    pub async fn on_fragment(&mut self, fragment: &str) {
        self.state.push(fragment);
        let now = Instant::now();
        if !self.state.flush_due(now) {
            return;
        }

        let content = MessageContent::Text(self.state.in_progress_text());
        match self
            .sink
            .update_message(&self.target.channel, &self.target.message_ts, &content)
            .await
        {
            Ok(()) => {
                let doubled = self.state.record_flush(now);
                debug!(
                    channel = %self.target.channel,
                    message_ts = %self.target.message_ts,
                    update_count = self.state.update_count(),
                    buffer_len = self.state.buffer().len(),
                    "Flushed partial reply"
                );
                if doubled {
                    info!(
                        update_count = self.state.update_count(),
                        interval_secs = self.state.interval().as_secs(),
                        "Flush interval doubled"
                    );
                }
            }
            Err(e) => {
                self.state.record_failed_flush(now);
                warn!(
                    error = %e,
                    channel = %self.target.channel,
                    message_ts = %self.target.message_ts,
                    "Partial update failed; next flush will carry the buffer"
                );
            }
        }
    }

    /// Records `final_text` as the assistant turn, then replaces the placeholder with the rendered reply.
    ///
    /// Both steps are attempted; a sink failure is reported first, otherwise a history failure.
    pub async fn on_stream_end(self, final_text: &str) -> Result<(), SlackbotError> {
        let history_result = self
            .history
            .append_assistant(&self.target.conversation_key, final_text)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    conversation_key = %self.target.conversation_key,
                    "Failed to record assistant reply; thread history is missing this turn"
                );
                SlackbotError::History(e.to_string())
            });

        let content = RenderedMessage::new(final_text, self.disclaimer.as_str()).into_content();
        let sink_result = self.write_final(&content).await;

        info!(
            channel = %self.target.channel,
            conversation_key = %self.target.conversation_key,
            update_count = self.state.update_count(),
            reply_len = final_text.len(),
            "Reply finished"
        );
        sink_result.and(history_result)
    }

    /// Shows the partial buffer with an incomplete notice. Nothing is written to history.
    pub async fn on_stream_error(self, reason: &str) -> Result<(), SlackbotError> {
        warn!(
            channel = %self.target.channel,
            conversation_key = %self.target.conversation_key,
            reason = %reason,
            partial_len = self.state.buffer().len(),
            "Completion stream failed; reply left incomplete"
        );
        let content = failure_notice(self.state.buffer());
        self.write_final(&content).await?;
        Err(SlackbotError::Llm(reason.to_string()))
    }

    /// Closing write, retried while Slack reports a rate limit.
    async fn write_final(&self, content: &MessageContent) -> Result<(), SlackbotError> {
        let mut attempt = 1;
        loop {
            match self
                .sink
                .update_message(&self.target.channel, &self.target.message_ts, content)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => match e.retry_after_secs() {
                    Some(secs) if attempt < FINAL_UPDATE_ATTEMPTS => {
                        warn!(
                            error = %e,
                            attempt,
                            "Final update rate limited, retrying after {}s", secs
                        );
                        tokio::time::sleep(Duration::from_secs(secs)).await;
                        attempt += 1;
                    }
                    _ => {
                        error!(
                            error = %e,
                            channel = %self.target.channel,
                            message_ts = %self.target.message_ts,
                            "Final update failed"
                        );
                        return Err(e);
                    }
                },
            }
        }
    }
}

/// **Entry point.** Applies events from `rx` to `relay` until the stream ends.
///
/// A channel closed without [`RelayEvent::End`] or [`RelayEvent::Error`] counts as a failed stream.
pub async fn run_relay(
    mut relay: StreamRelay,
    mut rx: mpsc::Receiver<RelayEvent>,
) -> Result<(), SlackbotError> {
    while let Some(event) = rx.recv().await {
        match event {
            RelayEvent::Fragment(fragment) => relay.on_fragment(&fragment).await,
            RelayEvent::End(final_text) => return relay.on_stream_end(&final_text).await,
            RelayEvent::Error(reason) => return relay.on_stream_error(&reason).await,
        }
    }
    relay
        .on_stream_error("completion stream closed without finishing")
        .await
}
