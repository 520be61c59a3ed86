//! Integration test — serve the router on a real port and relay over WebSockets.

use std::sync::Arc;
use std::time::Duration;

use ami_api::config::ApiConfig;
use ami_api::{AppState, router};
use ami_core::assistant::AiReplyService;
use ami_core::config::AssistantConfig;
use ami_core::relay::TopicHub;
use chrono::DateTime;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves the router on an ephemeral port; returns the WebSocket URL and
/// the hub behind it.
async fn spawn_server() -> (String, Arc<TopicHub>) {
    let service = AiReplyService::new(AssistantConfig::default()).unwrap();
    let state = AppState::new(ApiConfig::default(), service);
    let hub = state.hub.clone();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("ws://{addr}/ws"), hub)
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::text(frame.to_string()))
        .await
        .expect("send frame");
}

/// Next JSON text frame, failing after two seconds.
async fn next_frame(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("frame is JSON");
        }
    }
}

/// Connects and subscribes `user` to their message topic.
async fn connect_as(url: &str, user: &str) -> Client {
    let (mut client, _) = connect_async(url).await.expect("connect");
    send(
        &mut client,
        json!({"type": "subscribe", "destination": format!("/topic/messages/{user}")}),
    )
    .await;
    // Frames are handled in order, so the pong proves the subscription is live.
    send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut client).await, json!({"type": "pong"}));
    client
}

#[tokio::test]
async fn message_reaches_recipient_and_sender_with_server_timestamp() {
    let (url, _hub) = spawn_server().await;
    let mut alice = connect_as(&url, "alice").await;
    let mut bob = connect_as(&url, "bob").await;

    send(
        &mut alice,
        json!({
            "type": "send",
            "destination": "/app/chat",
            "body": {
                "sender": "alice",
                "recipient": "bob",
                "content": "hi",
                "timestamp": "spoofed"
            }
        }),
    )
    .await;

    let to_bob = next_frame(&mut bob).await;
    let to_alice = next_frame(&mut alice).await;

    assert_eq!(to_bob["type"], "message");
    assert_eq!(to_bob["destination"], "topic/messages/bob");
    assert_eq!(to_alice["destination"], "topic/messages/alice");

    let body = &to_bob["body"];
    assert_eq!(body["sender"], "alice");
    assert_eq!(body["recipient"], "bob");
    assert_eq!(body["content"], "hi");
    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    assert_ne!(timestamp, "spoofed");
    assert!(
        DateTime::parse_from_rfc3339(timestamp).is_ok(),
        "unexpected timestamp: {timestamp}"
    );

    assert_eq!(to_bob["body"], to_alice["body"]);
}

#[tokio::test]
async fn unknown_destination_is_reported() {
    let (url, _hub) = spawn_server().await;
    let mut alice = connect_as(&url, "alice").await;

    send(
        &mut alice,
        json!({
            "type": "send",
            "destination": "/app/elsewhere",
            "body": {"sender": "alice", "recipient": "bob", "content": "hi"}
        }),
    )
    .await;

    let frame = next_frame(&mut alice).await;
    assert_eq!(frame["type"], "error");
    assert!(frame["message"].as_str().unwrap().contains("/app/elsewhere"));
}

#[tokio::test]
async fn malformed_frame_keeps_session_open() {
    let (url, _hub) = spawn_server().await;
    let mut alice = connect_as(&url, "alice").await;

    alice.send(Message::text("not json".to_string())).await.unwrap();
    assert_eq!(next_frame(&mut alice).await["type"], "error");

    send(&mut alice, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut alice).await, json!({"type": "pong"}));
}

#[tokio::test]
async fn unsubscribe_releases_topic() {
    let (url, hub) = spawn_server().await;
    let mut alice = connect_as(&url, "alice").await;
    assert_eq!(hub.subscriber_count("topic/messages/alice"), 1);

    send(
        &mut alice,
        json!({"type": "unsubscribe", "destination": "/topic/messages/alice"}),
    )
    .await;
    send(&mut alice, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut alice).await, json!({"type": "pong"}));

    assert_eq!(hub.topic_count(), 0);
}

#[tokio::test]
async fn closing_socket_releases_topics() {
    let (url, hub) = spawn_server().await;
    let mut alice = connect_as(&url, "alice").await;
    send(
        &mut alice,
        json!({"type": "subscribe", "destination": "/topic/messages/u1"}),
    )
    .await;
    send(&mut alice, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut alice).await, json!({"type": "pong"}));
    assert_eq!(hub.topic_count(), 2);

    alice.close(None).await.unwrap();

    // The server tears the session down asynchronously.
    tokio::time::timeout(Duration::from_secs(2), async {
        while hub.topic_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("topics still held after close");
}
