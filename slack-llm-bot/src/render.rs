//! Final message layout: reply body, divider, and a context footer carrying the disclaimer.

use slackbot_core::{Block, MessageContent, TextObject};

/// Footer shown under every finished reply unless `DISCLAIMER_TEXT` overrides it.
pub const DEFAULT_DISCLAIMER: &str =
    "Generated by an AI model. Answers may be inaccurate; verify important information.";

/// Shown after the partial text when the completion service fails mid-reply.
pub const INCOMPLETE_NOTICE: &str = "_(The response is incomplete: the completion service failed.)_";

/// Slack rejects a section whose text exceeds this many characters.
pub const SECTION_TEXT_LIMIT: usize = 3000;

/// Splits `body` into consecutive pieces of at most `limit` characters, cut on char boundaries.
/// An empty body yields one empty piece.
fn split_section_text(body: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = body;
    while rest.chars().count() > limit {
        let cut = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(i, _)| i);
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}

/// A finished reply, built once when the stream ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub body: String,
    pub disclaimer: String,
}

impl RenderedMessage {
    pub fn new(body: impl Into<String>, disclaimer: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            disclaimer: disclaimer.into(),
        }
    }

    /// One or more `section`s (body, [`SECTION_TEXT_LIMIT`] chars each) + `divider` + `context` (disclaimer).
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks: Vec<Block> = split_section_text(&self.body, SECTION_TEXT_LIMIT)
            .into_iter()
            .map(|piece| Block::Section {
                text: TextObject::mrkdwn(piece),
            })
            .collect();
        blocks.push(Block::Divider);
        blocks.push(Block::Context {
            elements: vec![TextObject::mrkdwn(self.disclaimer.clone())],
        });
        blocks
    }

    /// Blocks for display; the body doubles as the notification fallback text.
    pub fn into_content(self) -> MessageContent {
        let blocks = self.blocks();
        MessageContent::Blocks {
            text: self.body,
            blocks,
        }
    }
}

/// Plain-text notice for a reply that failed part way: the partial text, then [`INCOMPLETE_NOTICE`].
pub fn failure_notice(partial: &str) -> MessageContent {
    if partial.is_empty() {
        MessageContent::Text(INCOMPLETE_NOTICE.to_string())
    } else {
        MessageContent::Text(format!("{partial}\n\n{INCOMPLETE_NOTICE}"))
    }
}
