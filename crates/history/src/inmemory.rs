//! In-memory implementation of the HistoryStore trait.

use super::{HistoryEntry, HistoryStore};
use async_trait::async_trait;
use slackbot_core::ConversationKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Slot {
    entries: Vec<HistoryEntry>,
    expires_at: Instant,
}

/// In-memory history store for development and tests.
///
/// Expiry is sliding: every append pushes the key's deadline to `now + ttl`, like `EXPIRE` after `RPUSH`.
/// Each append also drops every slot that has already expired, so abandoned threads do not accumulate.
#[derive(Debug, Clone)]
pub struct InMemoryHistoryStore {
    slots: Arc<RwLock<HashMap<ConversationKey, Slot>>>,
    ttl: Duration,
}

impl InMemoryHistoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of keys currently held, expired ones included until the next append sweeps them.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, key: &ConversationKey) -> Result<Vec<HistoryEntry>, anyhow::Error> {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            match slots.get(key) {
                None => return Ok(Vec::new()),
                Some(slot) if slot.expires_at > now => return Ok(slot.entries.clone()),
                Some(_) => {}
            }
        }
        let mut slots = self.slots.write().await;
        if slots.get(key).is_some_and(|slot| slot.expires_at <= now) {
            slots.remove(key);
            debug!(conversation_key = %key, "History expired");
        }
        Ok(Vec::new())
    }

    async fn append(&self, key: &ConversationKey, entry: HistoryEntry) -> Result<(), anyhow::Error> {
        let now = Instant::now();
        let expires_at = now + self.ttl;
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.expires_at > now);
        let swept = before - slots.len();
        if swept > 0 {
            debug!(swept, "Dropped expired history");
        }
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            entries: Vec::new(),
            expires_at,
        });
        slot.entries.push(entry);
        slot.expires_at = expires_at;
        debug!(
            conversation_key = %key,
            entry_count = slot.entries.len(),
            "Appended history entry"
        );
        Ok(())
    }
}
