//! Assistant chat handler.

use ami_core::assistant::{AiReplyEnvelope, ChatTurnRequest};
use axum::Json;
use axum::extract::State;

use crate::AppState;

/// `POST /api/ai-chat` — answer one chat turn.
///
/// Always 200: provider failures come back as a polite `reply`.
pub async fn ai_chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatTurnRequest>,
) -> Json<AiReplyEnvelope> {
    Json(state.assistant.create_reply(&request).await)
}
