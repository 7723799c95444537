//! Core types: channel, conversation key, thread anchor and the inbound mention event.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack channel id (e.g. `C0123456789`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a thread: the timestamp of its root message, scoped to its channel.
///
/// `ts` values are only unique within a channel, so the channel is part of the key.
/// Displays as `{channel}:{thread_ts}`, the form used for history keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    channel: Channel,
    thread_ts: String,
}

impl ConversationKey {
    pub fn new(channel: Channel, thread_ts: impl Into<String>) -> Self {
        Self {
            channel,
            thread_ts: thread_ts.into(),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Root timestamp of the thread; replies are posted under it.
    pub fn thread_ts(&self) -> &str {
        &self.thread_ts
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.thread_ts)
    }
}

/// Where a mention sits: a new root message, or a reply inside an existing thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadAnchor {
    /// The mention starts a thread; its own timestamp becomes the thread root.
    Root { ts: String },
    /// The mention is a reply; `thread_ts` is the root of the thread it belongs to.
    Reply { thread_ts: String, ts: String },
}

impl ThreadAnchor {
    /// Resolves the anchor from the raw event fields: a present `thread_ts` means a reply.
    pub fn from_event_fields(ts: &str, thread_ts: Option<&str>) -> Self {
        match thread_ts {
            Some(root) if !root.is_empty() => ThreadAnchor::Reply {
                thread_ts: root.to_string(),
                ts: ts.to_string(),
            },
            _ => ThreadAnchor::Root { ts: ts.to_string() },
        }
    }

    /// Root timestamp of the thread the mention belongs to.
    pub fn thread_ts(&self) -> &str {
        match self {
            ThreadAnchor::Root { ts } => ts,
            ThreadAnchor::Reply { thread_ts, .. } => thread_ts,
        }
    }

    /// Timestamp of the message that carried the mention.
    pub fn message_ts(&self) -> &str {
        match self {
            ThreadAnchor::Root { ts } | ThreadAnchor::Reply { ts, .. } => ts,
        }
    }
}

/// An `app_mention` event after boundary parsing.
#[derive(Debug, Clone)]
pub struct MentionEvent {
    pub channel: Channel,
    pub user: Option<String>,
    /// Raw message text, still containing the `<@U…>` mention markup.
    pub text: String,
    pub anchor: ThreadAnchor,
}

impl MentionEvent {
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.channel.clone(), self.anchor.thread_ts())
    }
}
