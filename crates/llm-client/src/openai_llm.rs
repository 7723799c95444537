//! OpenAI implementation of [`LlmClient`]: wraps openai-client with a fixed model and temperature.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::StreamChunk as OpenAIStreamChunk;
use prompt::ChatMessage;
use tracing::instrument;

use super::{chat_message_to_openai, LlmClient, LlmConfig, StreamChunk, StreamChunkCallback};
use crate::config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// [`LlmClient`] backed by openai-client.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
    temperature: f32,
}

impl OpenAILlmClient {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Builds a client from any [`LlmConfig`] (key, base URL, model, temperature).
    pub fn from_config(config: &dyn LlmConfig) -> Self {
        Self::with_base_url(config.api_key().to_string(), config.base_url().to_string())
            .with_model(config.model().to_string())
            .with_temperature(config.temperature())
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn to_openai_messages(
        messages: &[ChatMessage],
    ) -> Result<Vec<openai_client::ChatCompletionRequestMessage>> {
        messages.iter().map(chat_message_to_openai).collect()
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model))]
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let openai_messages = Self::to_openai_messages(&messages)?;
        self.client
            .chat_completion(&self.model, self.temperature, openai_messages)
            .await
    }

    #[instrument(skip(self, messages, callback), fields(model = %self.model))]
    async fn get_llm_response_stream_with_messages(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String> {
        let openai_messages = Self::to_openai_messages(&messages)?;
        self.client
            .chat_completion_stream(
                &self.model,
                self.temperature,
                openai_messages,
                |chunk: OpenAIStreamChunk| {
                    callback(StreamChunk {
                        content: chunk.content,
                    })
                },
            )
            .await
    }
}
