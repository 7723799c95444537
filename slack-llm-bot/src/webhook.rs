//! Slack Events API ingress.
//!
//! `POST /slack/events` answers `url_verification` with its challenge and acknowledges every
//! `event_callback` with `200` before any reply work starts; `app_mention` events are handed to a
//! [`MentionProcessor`] on a spawned task. `GET /health` is a liveness check.

use crate::handler::MentionHandler;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use slackbot_core::{Channel, MentionEvent, SlackbotError, ThreadAnchor};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Receives mentions after they have been acknowledged.
#[async_trait]
pub trait MentionProcessor: Send + Sync {
    async fn process(&self, event: MentionEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl MentionProcessor for MentionHandler {
    async fn process(&self, event: MentionEvent) -> anyhow::Result<()> {
        self.handle(event).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AppMentionPayload {
    channel: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: String,
    ts: String,
    #[serde(default)]
    thread_ts: Option<String>,
}

impl From<AppMentionPayload> for MentionEvent {
    fn from(payload: AppMentionPayload) -> Self {
        MentionEvent {
            channel: Channel::new(payload.channel),
            user: payload.user,
            text: payload.text,
            anchor: ThreadAnchor::from_event_fields(&payload.ts, payload.thread_ts.as_deref()),
        }
    }
}

/// Parses the inner event of an `event_callback`; `None` for anything that is not a well-formed `app_mention`.
fn parse_app_mention(event: serde_json::Value) -> Option<MentionEvent> {
    let event_type = event.get("type").and_then(|t| t.as_str()).unwrap_or_default();
    if event_type != "app_mention" {
        debug!(event_type, "Ignoring event");
        return None;
    }
    match serde_json::from_value::<AppMentionPayload>(event) {
        Ok(payload) => Some(payload.into()),
        Err(e) => {
            warn!(error = %e, "Malformed app_mention event");
            None
        }
    }
}

#[derive(Clone)]
struct WebhookState {
    processor: Arc<dyn MentionProcessor>,
}

pub fn router(processor: Arc<dyn MentionProcessor>) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .route("/health", get(|| async { "ok" }))
        .with_state(WebhookState { processor })
}

async fn handle_events(State(state): State<WebhookState>, body: Bytes) -> impl IntoResponse {
    let envelope: Envelope = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Failed to parse webhook body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match envelope {
        Envelope::UrlVerification { challenge } => {
            info!("Answering url_verification");
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Envelope::EventCallback { event } => {
            if let Some(mention) = parse_app_mention(event) {
                let processor = state.processor.clone();
                tokio::spawn(async move {
                    let channel = mention.channel.clone();
                    let conversation_key = mention.conversation_key();
                    if let Err(e) = processor.process(mention).await {
                        error!(
                            error = %format!("{e:#}"),
                            channel = %channel,
                            conversation_key = %conversation_key,
                            "Mention reply failed"
                        );
                    }
                });
            }
            StatusCode::OK.into_response()
        }
        Envelope::Other => StatusCode::OK.into_response(),
    }
}

/// Serves the webhook on `addr` until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    processor: Arc<dyn MentionProcessor>,
    shutdown: F,
) -> Result<(), SlackbotError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Slack Events webhook server listening");
    axum::serve(listener, router(processor))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Webhook server stopped");
    Ok(())
}
