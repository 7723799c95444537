//! Hand-written collaborators for integration tests: a recording Slack sink, a scripted
//! completion source and a history store that logs appends and can be made to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use history::{HistoryEntry, HistoryStore, InMemoryHistoryStore};
use llm_client::{LlmClient, StreamChunk, StreamChunkCallback};
use prompt::{ChatMessage, MessageRole};
use slackbot_core::{
    Block, Channel, ConversationKey, ConversationSink, MentionEvent, MessageContent, SlackbotError,
    ThreadAnchor,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PLACEHOLDER_TS: &str = "1700000099.000001";
pub const DISCLAIMER: &str = "AI-generated.";

// ---------- Sink ----------

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Post {
        channel: String,
        thread_ts: String,
        text: String,
    },
    Update {
        channel: String,
        message_ts: String,
        content: MessageContent,
    },
}

/// Records successful posts/updates; failures can be queued for upcoming updates.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    update_failures: Mutex<VecDeque<SlackbotError>>,
    update_attempts: AtomicUsize,
    fail_post: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next update call fails with `error` (queued in order).
    pub fn fail_next_update(&self, error: SlackbotError) {
        self.update_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_posts(&self) {
        self.fail_post.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }

    /// Contents of successful updates, in delivery order.
    pub fn updates(&self) -> Vec<MessageContent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Update { content, .. } => Some(content),
                SinkCall::Post { .. } => None,
            })
            .collect()
    }

    /// Successful plain-text updates sent while streaming.
    pub fn intermediate_updates(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|c| match c {
                MessageContent::Text(text) => Some(text),
                MessageContent::Blocks { .. } => None,
            })
            .collect()
    }

    pub fn last_update(&self) -> Option<MessageContent> {
        self.updates().pop()
    }

    pub fn posts(&self) -> Vec<SinkCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, SinkCall::Post { .. }))
            .collect()
    }
}

#[async_trait]
impl ConversationSink for RecordingSink {
    async fn post_message(
        &self,
        channel: &Channel,
        thread_ts: &str,
        text: &str,
    ) -> slackbot_core::Result<String> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(SlackbotError::Slack {
                method: "chat.postMessage".to_string(),
                error: "channel_not_found".to_string(),
            });
        }
        self.calls.lock().unwrap().push(SinkCall::Post {
            channel: channel.to_string(),
            thread_ts: thread_ts.to_string(),
            text: text.to_string(),
        });
        Ok(PLACEHOLDER_TS.to_string())
    }

    async fn update_message(
        &self,
        channel: &Channel,
        message_ts: &str,
        content: &MessageContent,
    ) -> slackbot_core::Result<()> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.update_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.calls.lock().unwrap().push(SinkCall::Update {
            channel: channel.to_string(),
            message_ts: message_ts.to_string(),
            content: content.clone(),
        });
        Ok(())
    }
}

/// Body text (all leading sections joined) and disclaimer of a rendered (blocks) update.
pub fn rendered_parts(content: &MessageContent) -> Option<(String, String)> {
    let blocks = content.blocks()?;
    let (sections, tail) = blocks.split_at(blocks.len().checked_sub(2)?);
    let disclaimer = match tail {
        [Block::Divider, Block::Context { elements }] => {
            elements.first().map(|e| e.text().to_string()).unwrap_or_default()
        }
        _ => return None,
    };
    if sections.is_empty() {
        return None;
    }
    let mut body = String::new();
    for block in sections {
        match block {
            Block::Section { text } => body.push_str(text.text()),
            _ => return None,
        }
    }
    Some((body, disclaimer))
}

// ---------- Completion source ----------

#[derive(Debug, Clone)]
pub enum Step {
    /// Wait `after`, then deliver `text`.
    Fragment { text: String, after: Duration },
    Fail(String),
}

pub fn fragment(text: &str, after_ms: u64) -> Step {
    Step::Fragment {
        text: text.to_string(),
        after: Duration::from_millis(after_ms),
    }
}

/// Plays back a fixed script and records every prompt it receives.
pub struct ScriptedLlm {
    steps: Vec<Step>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn get_llm_response_with_messages(
        &self,
        messages: Vec<ChatMessage>,
    ) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(messages);
        let mut full = String::new();
        for step in &self.steps {
            match step {
                Step::Fragment { text, .. } => full.push_str(text),
                Step::Fail(reason) => anyhow::bail!("{reason}"),
            }
        }
        Ok(full)
    }

    async fn get_llm_response_stream_with_messages(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(messages);
        let mut full = String::new();
        for step in &self.steps {
            match step {
                Step::Fragment { text, after } => {
                    if !after.is_zero() {
                        tokio::time::sleep(*after).await;
                    }
                    full.push_str(text);
                    callback(StreamChunk {
                        content: text.clone(),
                    })
                    .await?;
                }
                Step::Fail(reason) => anyhow::bail!("{reason}"),
            }
        }
        Ok(full)
    }
}

// ---------- History ----------

/// In-memory history that also logs every append and can fail loads or appends on demand.
pub struct RecordingHistory {
    inner: InMemoryHistoryStore,
    appends: Mutex<Vec<(ConversationKey, HistoryEntry)>>,
    fail_load: AtomicBool,
    fail_append: AtomicBool,
}

impl RecordingHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryHistoryStore::new(Duration::from_secs(3600)),
            appends: Mutex::new(Vec::new()),
            fail_load: AtomicBool::new(false),
            fail_append: AtomicBool::new(false),
        })
    }

    pub fn fail_loads(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    pub fn fail_appends(&self) {
        self.fail_append.store(true, Ordering::SeqCst);
    }

    pub fn appends(&self) -> Vec<(ConversationKey, HistoryEntry)> {
        self.appends.lock().unwrap().clone()
    }

    pub fn appends_with_role(&self, role: MessageRole) -> Vec<HistoryEntry> {
        self.appends()
            .into_iter()
            .map(|(_, e)| e)
            .filter(|e| e.role == role)
            .collect()
    }

    /// Seeds an entry for `channel`'s thread without logging it as an append.
    pub async fn seed(&self, channel: &str, thread_ts: &str, entry: HistoryEntry) {
        self.inner
            .append(&ConversationKey::new(Channel::new(channel), thread_ts), entry)
            .await
            .unwrap();
    }
}

#[async_trait]
impl HistoryStore for RecordingHistory {
    async fn load(&self, key: &ConversationKey) -> anyhow::Result<Vec<HistoryEntry>> {
        if self.fail_load.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        self.inner.load(key).await
    }

    async fn append(&self, key: &ConversationKey, entry: HistoryEntry) -> anyhow::Result<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        self.appends
            .lock()
            .unwrap()
            .push((key.clone(), entry.clone()));
        self.inner.append(key, entry).await
    }
}

// ---------- Events ----------

pub fn root_mention(channel: &str, ts: &str, text: &str) -> MentionEvent {
    MentionEvent {
        channel: Channel::new(channel),
        user: Some("U0USER".to_string()),
        text: text.to_string(),
        anchor: ThreadAnchor::from_event_fields(ts, None),
    }
}

pub fn reply_mention(channel: &str, thread_ts: &str, ts: &str, text: &str) -> MentionEvent {
    MentionEvent {
        channel: Channel::new(channel),
        user: Some("U0USER".to_string()),
        text: text.to_string(),
        anchor: ThreadAnchor::from_event_fields(ts, Some(thread_ts)),
    }
}
