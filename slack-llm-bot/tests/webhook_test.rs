//! Events API webhook tests: URL verification, immediate acknowledgment and mention dispatch.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use slack_llm_bot::{router, MentionProcessor};
use slackbot_core::{MentionEvent, ThreadAnchor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Forwards every processed mention to the test, optionally never finishing.
struct ForwardingProcessor {
    tx: mpsc::UnboundedSender<MentionEvent>,
    hang: bool,
}

#[async_trait]
impl MentionProcessor for ForwardingProcessor {
    async fn process(&self, event: MentionEvent) -> anyhow::Result<()> {
        let _ = self.tx.send(event);
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

fn app(hang: bool) -> (axum::Router, mpsc::UnboundedReceiver<MentionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (router(Arc::new(ForwardingProcessor { tx, hang })), rx)
}

fn post_events(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// **Test: url_verification echoes the challenge.**
#[tokio::test]
async fn test_url_verification_returns_challenge() {
    let (app, _rx) = app(false);
    let response = app
        .oneshot(post_events(serde_json::json!({
            "type": "url_verification",
            "token": "t",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"})
    );
}

/// **Test: A reply-in-thread app_mention is acknowledged and dispatched with its thread anchor.**
#[tokio::test]
async fn test_app_mention_is_dispatched() {
    let (app, mut rx) = app(false);
    let response = app
        .oneshot(post_events(serde_json::json!({
            "type": "event_callback",
            "team_id": "T1",
            "event": {
                "type": "app_mention",
                "user": "U0USER",
                "text": "<@U0BOT> what time is it",
                "ts": "1700000050.000200",
                "thread_ts": "1700000000.000100",
                "channel": "C1",
                "event_ts": "1700000050.000200"
            }
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.channel.as_str(), "C1");
    assert_eq!(event.user.as_deref(), Some("U0USER"));
    assert_eq!(event.text, "<@U0BOT> what time is it");
    assert_eq!(
        event.anchor,
        ThreadAnchor::Reply {
            thread_ts: "1700000000.000100".to_string(),
            ts: "1700000050.000200".to_string(),
        }
    );
    assert_eq!(event.conversation_key().to_string(), "C1:1700000000.000100");
}

/// **Test: The acknowledgment does not wait for the reply work.**
#[tokio::test]
async fn test_ack_is_independent_of_processing() {
    let (app, mut rx) = app(true);
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        app.oneshot(post_events(serde_json::json!({
            "type": "event_callback",
            "event": {
                "type": "app_mention",
                "text": "<@U0BOT> hi",
                "ts": "1700000000.000100",
                "channel": "C1"
            }
        }))),
    )
    .await
    .expect("ack must not wait for processing")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let event = rx.recv().await.unwrap();
    assert_eq!(event.conversation_key().thread_ts(), "1700000000.000100");
}

/// **Test: Other event types are acknowledged and ignored.**
#[tokio::test]
async fn test_other_events_are_ignored() {
    let (app, mut rx) = app(false);
    let response = app
        .clone()
        .oneshot(post_events(serde_json::json!({
            "type": "event_callback",
            "event": {"type": "message", "text": "hello", "ts": "1.0", "channel": "C1"}
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_events(serde_json::json!({"type": "app_rate_limited"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let dispatched = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(!matches!(dispatched, Ok(Some(_))));
}

/// **Test: A malformed body is rejected.**
#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _rx) = app(false);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack/events")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// **Test: Health check answers ok.**
#[tokio::test]
async fn test_health() {
    let (app, _rx) = app(false);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}
