//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait (the completion stream source) and an OpenAI implementation.
//! Transport-agnostic; the bot only sees [`ChatMessage`]s in and text fragments out.
//!
//! The stream method uses a boxed callback so that [`LlmClient`] is object-safe (dyn compatible).

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use prompt::{ChatMessage, MessageRole};
use std::future::Future;
use std::pin::Pin;

pub mod config;
mod openai_llm;

pub use config::{EnvLlmConfig, LlmConfig};
pub use openai_llm::OpenAILlmClient;

/// A fragment of streamed LLM output; aligned with `openai_client::StreamChunk`.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub content: String,
}

/// Type-erased callback for stream chunks so that [`LlmClient`] is dyn compatible.
pub type StreamChunkCallback =
    dyn FnMut(StreamChunk) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send;

/// LLM client interface: request completion or streamed completion from a full prompt.
///
/// `messages` is sent as-is; callers put the system message first.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the model reply text for the given messages.
    async fn get_llm_response_with_messages(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Streamed completion: invokes `callback` for each fragment in order and returns the full reply text.
    /// An error from the callback aborts the stream and is returned.
    async fn get_llm_response_stream_with_messages(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String>;
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_to_openai_maps_roles() {
        let system = chat_message_to_openai(&ChatMessage::system("s")).unwrap();
        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));

        let user = chat_message_to_openai(&ChatMessage::user("u")).unwrap();
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));

        let assistant = chat_message_to_openai(&ChatMessage::assistant("a")).unwrap();
        assert!(matches!(assistant, ChatCompletionRequestMessage::Assistant(_)));
    }
}
