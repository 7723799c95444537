//! # History
//!
//! Per-thread conversation history: an ordered list of role-tagged entries keyed by
//! [`slackbot_core::ConversationKey`], expiring after a period of inactivity.
//!
//! Two backends implement [`HistoryStore`]:
//!
//! - [`RedisHistoryStore`]: one Redis list per thread, shared across processes.
//! - [`InMemoryHistoryStore`]: process-local map with the same expiry rules.

mod inmemory;
mod redis_store;
mod store;
mod types;

pub use inmemory::InMemoryHistoryStore;
pub use redis_store::RedisHistoryStore;
pub use store::HistoryStore;
pub use types::HistoryEntry;

/// Default history lifetime after the last append.
pub const DEFAULT_HISTORY_TTL_SECS: u64 = 3600;

/// Default key prefix for history lists.
pub const DEFAULT_HISTORY_NAMESPACE: &str = "slack-llm-bot";
