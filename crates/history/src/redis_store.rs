//! Redis implementation of the HistoryStore trait.
//!
//! Each conversation is one Redis list of JSON-encoded [`HistoryEntry`] values under
//! `{namespace}:{channel}:{thread_ts}`. Every append refreshes the key's expiry.

use super::{HistoryEntry, HistoryStore};
use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use slackbot_core::ConversationKey;
use std::time::Duration;
use tracing::{debug, warn};

/// Redis-backed history store shared by all bot replicas.
#[derive(Clone)]
pub struct RedisHistoryStore {
    manager: ConnectionManager,
    namespace: String,
    ttl: Duration,
}

impl RedisHistoryStore {
    /// Opens a managed connection to `redis_url`.
    pub async fn connect(
        redis_url: &str,
        namespace: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, anyhow::Error> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("failed to open redis client for {}", redis_url))?;
        let manager = client
            .get_connection_manager()
            .await
            .context("failed to connect to redis")?;
        Ok(Self {
            manager,
            namespace: namespace.into(),
            ttl,
        })
    }

    fn redis_key(&self, key: &ConversationKey) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs().max(1) as i64
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, key: &ConversationKey) -> Result<Vec<HistoryEntry>, anyhow::Error> {
        let redis_key = self.redis_key(key);
        let mut conn = self.manager.clone();
        let raw: Vec<String> = conn
            .lrange(&redis_key, 0, -1)
            .await
            .with_context(|| format!("failed to read history {redis_key} from redis"))?;

        let entries = raw
            .iter()
            .filter_map(|item| match serde_json::from_str::<HistoryEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key = %redis_key, error = %e, "Skipping malformed history entry");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(key = %redis_key, entry_count = entries.len(), "Loaded history");
        Ok(entries)
    }

    async fn append(&self, key: &ConversationKey, entry: HistoryEntry) -> Result<(), anyhow::Error> {
        let redis_key = self.redis_key(key);
        let payload = serde_json::to_string(&entry)?;
        let mut conn = self.manager.clone();
        redis::pipe()
            .atomic()
            .rpush(&redis_key, payload)
            .ignore()
            .expire(&redis_key, self.ttl_secs())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .with_context(|| format!("failed to append history {redis_key} to redis"))?;
        debug!(key = %redis_key, role = entry.role.as_str(), "Appended history entry");
        Ok(())
    }
}
