//! Conversation sink: posting and editing messages in a thread.
//!
//! [`ConversationSink`] is transport-agnostic; [`SlackWebClient`] implements it over the Slack Web API
//! (`chat.postMessage`, `chat.update`).

use crate::blocks::{Block, MessageContent};
use crate::error::{Result, SlackbotError};
use crate::types::Channel;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default Slack Web API base URL.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Used when Slack reports rate limiting without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Abstraction for posting and editing messages. Implementations map to a transport (e.g. Slack).
#[async_trait]
pub trait ConversationSink: Send + Sync {
    /// Posts `text` as a reply in the thread rooted at `thread_ts` and returns the new message's id (its `ts`).
    async fn post_message(&self, channel: &Channel, thread_ts: &str, text: &str) -> Result<String>;

    /// Replaces the content of an already-posted message.
    async fn update_message(
        &self,
        channel: &Channel,
        message_ts: &str,
        content: &MessageContent,
    ) -> Result<()>;
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    thread_ts: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct UpdateMessageRequest<'a> {
    channel: &'a str,
    ts: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<&'a [Block]>,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack Web API implementation of [`ConversationSink`].
#[derive(Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl SlackWebClient {
    /// Creates a client against `api_base` ([`SLACK_API_BASE`] in production, a mock server in tests).
    pub fn with_api_base(token: String, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            api_base,
        }
    }

    async fn call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.api_base.trim_end_matches('/'), method);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(SlackbotError::RateLimited { retry_after_secs });
        }

        let api: ApiResponse = response.error_for_status()?.json().await?;
        if !api.ok {
            let error = api.error.unwrap_or_else(|| "unknown_error".to_string());
            if error == "ratelimited" {
                return Err(SlackbotError::RateLimited {
                    retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
                });
            }
            return Err(SlackbotError::Slack {
                method: method.to_string(),
                error,
            });
        }
        Ok(api)
    }
}

#[async_trait]
impl ConversationSink for SlackWebClient {
    #[instrument(skip(self, text))]
    async fn post_message(&self, channel: &Channel, thread_ts: &str, text: &str) -> Result<String> {
        let request = PostMessageRequest {
            channel: channel.as_str(),
            thread_ts,
            text,
        };
        let response = self.call("chat.postMessage", &request).await?;
        let ts = response.ts.ok_or_else(|| SlackbotError::Slack {
            method: "chat.postMessage".to_string(),
            error: "missing ts in response".to_string(),
        })?;
        debug!(channel = %channel, ts = %ts, "Posted message");
        Ok(ts)
    }

    #[instrument(skip(self, content))]
    async fn update_message(
        &self,
        channel: &Channel,
        message_ts: &str,
        content: &MessageContent,
    ) -> Result<()> {
        let request = UpdateMessageRequest {
            channel: channel.as_str(),
            ts: message_ts,
            text: content.text(),
            blocks: content.blocks(),
        };
        self.call("chat.update", &request).await?;
        debug!(
            channel = %channel,
            ts = %message_ts,
            text_len = content.text().len(),
            "Updated message"
        );
        Ok(())
    }
}
