//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for chat completion (non-stream and stream).
//! Provides token masking for safe logging and a simple request/response API.

use async_openai::{types::CreateChatCompletionRequestArgs, Client};
use futures::StreamExt;
use std::sync::Arc;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// OpenAI chat client. Wraps async-openai client and keeps the API key for masked logging.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// API key stored only for logging (masked).
    api_key_for_logging: String,
}

/// One streamed fragment of completion text.
pub struct StreamChunk {
    /// Text delta carried by this chunk.
    pub content: String,
}

impl OpenAIClient {
    /// Builds a client against `base_url` (the public API, a proxy or a compatible endpoint).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let api_key_for_logging = api_key.clone();
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging,
        }
    }

    fn masked_key(&self) -> String {
        mask_token(&self.api_key_for_logging)
    }

    /// Sends a chat completion request and returns the full assistant reply as a string.
    ///
    /// Logs masked API key and token usage. Returns the first choice's content
    /// or an error if the response has no choices.
    pub async fn chat_completion(
        &self,
        model: &str,
        temperature: f32,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> anyhow::Result<String> {
        tracing::info!(
            model = %model,
            temperature,
            message_count = messages.len(),
            api_key = %self.masked_key(),
            "OpenAI chat_completion request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(temperature)
            .messages(messages)
            .build()?;

        if let Ok(json) = serde_json::to_string_pretty(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion request JSON");
        }

        let response = self.client.chat().create(request).await?;

        if let Some(ref u) = response.usage {
            tracing::info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat_completion usage"
            );
        }

        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone().unwrap_or_default()),
            None => anyhow::bail!("No response from OpenAI"),
        }
    }

    /// Streams chat completion and invokes `callback` once per non-empty content delta, in arrival order.
    /// Returns the full concatenated response text. Stream errors and callback errors are propagated.
    pub async fn chat_completion_stream<F, Fut>(
        &self,
        model: &str,
        temperature: f32,
        messages: Vec<ChatCompletionRequestMessage>,
        mut callback: F,
    ) -> anyhow::Result<String>
    where
        F: FnMut(StreamChunk) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        tracing::info!(
            model = %model,
            temperature,
            message_count = messages.len(),
            api_key = %self.masked_key(),
            "OpenAI chat_completion_stream request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(temperature)
            .messages(messages)
            .build()?;

        if let Ok(json) = serde_json::to_string_pretty(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion_stream request JSON");
        }

        let mut stream = self.client.chat().create_stream(request).await?;
        let mut full_response = String::new();
        let mut chunk_count: usize = 0;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| anyhow::anyhow!("Stream error: {}", e))?;
            if let Some(ref u) = chunk.usage {
                tracing::info!(
                    prompt_tokens = u.prompt_tokens,
                    completion_tokens = u.completion_tokens,
                    total_tokens = u.total_tokens,
                    "OpenAI chat_completion_stream usage"
                );
            }
            let Some(choice) = chunk.choices.first() else {
                continue;
            };
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    full_response.push_str(content);
                    chunk_count += 1;
                    callback(StreamChunk {
                        content: content.clone(),
                    })
                    .await?;
                }
            }
        }

        tracing::info!(
            chunk_count,
            response_len = full_response.len(),
            "OpenAI chat_completion_stream finished"
        );
        Ok(full_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_key_is_masked() {
        let client = OpenAIClient::with_base_url(
            "sk-proj-1234567890abcdefghijklmnopqrstuvwxyz".to_string(),
            "http://127.0.0.1:1/v1".to_string(),
        );
        assert_eq!(client.masked_key(), "sk-proj***wxyz");

        let short = OpenAIClient::with_base_url("sk-short".to_string(), "http://127.0.0.1:1/v1".to_string());
        assert_eq!(short.masked_key(), "***");
    }
}
