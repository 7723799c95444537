//! # Prompt
//!
//! Message roles and prompt assembly for the completion service.
//!
//! ## Format
//!
//! A prompt is an ordered list of role-tagged messages:
//!
//! - **System**: one instruction message, always first.
//! - **History**: prior turns of the thread, in insertion order.
//! - **User**: the new question, always last.
//!
//! ## External interactions
//!
//! - **AI models**: output is sent to chat-completion APIs (OpenAI and compatible endpoints).

use serde::{Deserialize, Serialize};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat message, one-to-one with one element of the OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Default system instruction when none is configured.
pub const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant in a Slack workspace. Answer concisely; Slack mrkdwn formatting is allowed.";

/// Builds the prompt `[system] + history + [user(question)]`.
///
/// History is taken in iteration order, which must be insertion order: it reconstructs the thread.
pub fn build_prompt<I>(system_message: &str, history: I, question: &str) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = ChatMessage>,
{
    let history = history.into_iter();
    let mut messages = Vec::with_capacity(history.size_hint().0 + 2);
    messages.push(ChatMessage::system(system_message));
    messages.extend(history);
    messages.push(ChatMessage::user(question));
    messages
}
