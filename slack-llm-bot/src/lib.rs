//! # slack_llm_bot
//!
//! Answers Slack `app_mention` events with LLM replies streamed into the thread.
//!
//! Flow: [`webhook`] acknowledges the event and spawns [`MentionHandler::handle`], which loads
//! thread history, builds the prompt, records the user turn, posts a placeholder, and hands the
//! completion stream to the [`relay`]. The relay edits the placeholder at an adaptive interval and
//! finishes with the rendered reply, which it also records in history.

pub mod cli;
pub mod config;
pub mod handler;
pub mod mention;
pub mod relay;
pub mod render;
pub mod runner;
pub mod webhook;

pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use handler::{MentionHandler, ReplySettings};
pub use relay::{run_relay, RelayEvent, RelayTarget, StreamRelay, StreamState};
pub use render::RenderedMessage;
pub use runner::{build_handler, create_history_store, run_bot};
pub use webhook::{router, MentionProcessor};
