//! # slackbot-core
//!
//! Core types and traits for the Slack LLM bridge: [`ConversationSink`] and its Slack Web API
//! implementation, Block Kit values, mention/thread types, errors, and tracing initialisation.

pub mod blocks;
pub mod error;
pub mod logger;
pub mod sink;
pub mod types;

pub use blocks::{Block, MessageContent, TextObject};
pub use error::{Result, SlackbotError};
pub use logger::init_tracing;
pub use sink::{ConversationSink, SlackWebClient, SLACK_API_BASE};
pub use types::{Channel, ConversationKey, MentionEvent, ThreadAnchor};
