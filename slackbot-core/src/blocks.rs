//! Block Kit values. Message layouts are built as typed values and serialized by serde,
//! never by string concatenation, so message text needs no JSON escaping by hand.

use serde::{Deserialize, Serialize};

/// A text object inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::Mrkdwn { text } => text,
        }
    }
}

/// The subset of layout blocks the bot renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Divider,
    Context { elements: Vec<TextObject> },
}

/// Content of a message update: plain text, or blocks with a plain-text fallback for notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Blocks { text: String, blocks: Vec<Block> },
}

impl MessageContent {
    /// Text sent in the `text` field of the API call.
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(text) | MessageContent::Blocks { text, .. } => text,
        }
    }

    pub fn blocks(&self) -> Option<&[Block]> {
        match self {
            MessageContent::Text(_) => None,
            MessageContent::Blocks { blocks, .. } => Some(blocks),
        }
    }
}
