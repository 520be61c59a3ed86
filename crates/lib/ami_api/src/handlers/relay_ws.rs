//! WebSocket relay endpoint.
//!
//! `GET /ws` upgrades to a WebSocket carrying JSON text frames tagged by
//! `type`. A session subscribes to user topics and sends chat messages to
//! the `/app/chat` destination:
//!
//! ```json
//! {"type":"subscribe","destination":"/topic/messages/alice"}
//! {"type":"send","destination":"/app/chat","body":{"sender":"alice","recipient":"bob","content":"hi"}}
//! ```
//!
//! Relayed messages arrive as `{"type":"message","destination":...,"body":...}`.
//! Sending produces no direct answer; the sender sees its own message through
//! its subscription. Problems are reported as `{"type":"error","message":...}`.

use std::collections::HashMap;

use ami_core::relay::{CHANNEL_PREFIX, ChatMessage, RelayError, normalize_destination};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Destination that relays a chat message.
pub const CHAT_DESTINATION: &str = "app/chat";

/// Frames queued for one socket before senders wait.
const OUTBOUND_BUFFER: usize = 64;

/// Frame sent by a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { destination: String },
    Unsubscribe { destination: String },
    Send { destination: String, body: ChatMessage },
    Ping,
}

/// Frame sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Message { destination: String, body: ChatMessage },
    Error { message: String },
    Pong,
}

/// Problems handling a client frame. Reported back as an error frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown destination: {0}")]
    UnknownDestination(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// `GET /ws` — upgrade to a relay session.
pub async fn relay_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Per-connection state: live topic subscriptions and the outbound queue.
struct Session {
    id: Uuid,
    outbound: mpsc::Sender<ServerFrame>,
    subscriptions: HashMap<String, JoinHandle<()>>,
}

impl Session {
    async fn handle_text(&mut self, state: &AppState, text: &str) -> Result<(), FrameError> {
        match serde_json::from_str::<ClientFrame>(text)? {
            ClientFrame::Subscribe { destination } => {
                let topic = topic_destination(&destination)?;
                if !self.subscriptions.contains_key(topic) {
                    let rx = state.hub.subscribe(topic);
                    let forwarder =
                        spawn_forwarder(rx, topic.to_string(), self.outbound.clone());
                    self.subscriptions.insert(topic.to_string(), forwarder);
                    debug!(session = %self.id, topic, "subscribed");
                }
            }
            ClientFrame::Unsubscribe { destination } => {
                let topic = normalize_destination(&destination);
                if let Some(forwarder) = self.subscriptions.remove(topic) {
                    stop_forwarder(state, topic, forwarder).await;
                    debug!(session = %self.id, topic, "unsubscribed");
                }
            }
            ClientFrame::Send { destination, body } => {
                if normalize_destination(&destination) != CHAT_DESTINATION {
                    return Err(FrameError::UnknownDestination(destination));
                }
                state.relay.on_message(body).await?;
            }
            ClientFrame::Ping => {
                let _ = self.outbound.send(ServerFrame::Pong).await;
            }
        }
        Ok(())
    }

    async fn close(&mut self, state: &AppState) {
        for (topic, forwarder) in self.subscriptions.drain() {
            stop_forwarder(state, &topic, forwarder).await;
        }
    }
}

/// Aborts a forwarder and, once its receiver is dropped, lets the hub
/// forget the topic if nobody else listens.
async fn stop_forwarder(state: &AppState, topic: &str, forwarder: JoinHandle<()>) {
    forwarder.abort();
    // Resolves after the task's future, and with it the receiver, is dropped.
    let _ = forwarder.await;
    if state.hub.release(topic) {
        debug!(topic, "released idle topic");
    }
}

/// Accepts only per-user message topics.
fn topic_destination(destination: &str) -> Result<&str, FrameError> {
    let topic = normalize_destination(destination);
    if topic.starts_with(CHANNEL_PREFIX) {
        Ok(topic)
    } else {
        Err(FrameError::UnknownDestination(destination.to_string()))
    }
}

/// Pushes every message on `rx` to the session's outbound queue.
fn spawn_forwarder(
    mut rx: broadcast::Receiver<ChatMessage>,
    topic: String,
    outbound: mpsc::Sender<ServerFrame>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(body) => {
                    let frame = ServerFrame::Message {
                        destination: topic.clone(),
                        body,
                    };
                    if outbound.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = %topic, skipped, "relay subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<ServerFrame>(OUTBOUND_BUFFER);

    let mut session = Session {
        id: Uuid::new_v4(),
        outbound,
        subscriptions: HashMap::new(),
    };
    info!(session = %session.id, "relay session opened");

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize relay frame");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(incoming) = ws_receiver.next().await {
        match incoming {
            Ok(Message::Text(text)) => {
                if let Err(e) = session.handle_text(&state, text.as_str()).await {
                    warn!(session = %session.id, error = %e, "rejected relay frame");
                    let _ = session
                        .outbound
                        .send(ServerFrame::Error {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(session = %session.id, error = %e, "relay receive error");
                break;
            }
        }
    }

    session.close(&state).await;
    writer.abort();
    info!(session = %session.id, "relay session closed");
}
