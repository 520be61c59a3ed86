//! # ami_api
//!
//! HTTP and WebSocket API library for AMI.

pub mod config;
pub mod handlers;

use std::sync::Arc;

use ami_core::assistant::AiReplyService;
use ami_core::relay::{MessageRelay, TopicHub};
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{ai_chat, health, relay_ws};

/// Route paths.
pub mod routes {
    pub const POST_API_AI_CHAT: &str = "/api/ai-chat";
    pub const GET_API_HEALTH: &str = "/api/health";
    pub const GET_WS: &str = "/ws";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Assistant reply service.
    pub assistant: Arc<AiReplyService>,
    /// Topic hub the relay publishes to and sessions subscribe on.
    pub hub: Arc<TopicHub>,
    /// Message relay bound to `hub`.
    pub relay: MessageRelay,
}

impl AppState {
    /// Wires the hub and relay for `config` around `assistant`.
    pub fn new(config: ApiConfig, assistant: AiReplyService) -> Self {
        let hub = Arc::new(TopicHub::new(config.channel_capacity));
        let relay = MessageRelay::new(hub.clone());
        Self {
            config,
            assistant: Arc::new(assistant),
            hub,
            relay,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let allowed_origin = state.config.allowed_origin.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| origin.as_bytes() == allowed_origin.as_bytes(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // REST routes, CORS-restricted to the chat client's origin
    let api = Router::new()
        .route(routes::POST_API_AI_CHAT, post(ai_chat::ai_chat_handler))
        .route(routes::GET_API_HEALTH, get(health::health_handler))
        .layer(cors);

    Router::new()
        .merge(api)
        .route(routes::GET_WS, get(relay_ws::relay_ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
