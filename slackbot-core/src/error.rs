use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlackbotError {
    #[error("Slack API error on {method}: {error}")]
    Slack { method: String, error: String },

    #[error("Rate limited by Slack, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("History store error: {0}")]
    History(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SlackbotError {
    /// Seconds to wait before retrying, when this error is a rate-limit rejection.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SlackbotError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SlackbotError>;
