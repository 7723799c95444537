//! History storage trait.

use async_trait::async_trait;
use slackbot_core::ConversationKey;

use super::types::HistoryEntry;

/// Append-only, per-thread conversation history with expiry handled by the store.
///
/// Entries for a key are never reordered or deleted by callers; they disappear only when the key expires.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns all live entries for `key` in insertion order; empty when the key is unknown or expired.
    async fn load(&self, key: &ConversationKey) -> Result<Vec<HistoryEntry>, anyhow::Error>;

    /// Appends one entry at the end of `key`'s history.
    async fn append(&self, key: &ConversationKey, entry: HistoryEntry) -> Result<(), anyhow::Error>;

    async fn append_user(&self, key: &ConversationKey, text: &str) -> Result<(), anyhow::Error> {
        self.append(key, HistoryEntry::user(text)).await
    }

    async fn append_assistant(&self, key: &ConversationKey, text: &str) -> Result<(), anyhow::Error> {
        self.append(key, HistoryEntry::assistant(text)).await
    }
}
