//! Tutoring chat endpoint

use axum::{extract::State, Json};
use tutor_core::prompts::HISTORY_WINDOW;

use crate::error::{require_non_empty, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/chat
///
/// The turn is stored even when the completion degraded, so the next
/// exchange still sees what the student asked.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    require_non_empty("message", &request.message)?;
    state.db.require_user(request.user_id).await?;

    let history: Vec<HistoryTurn> = state
        .db
        .get_recent_conversations(request.user_id, HISTORY_WINDOW as i64)
        .await?
        .iter()
        .map(DbConversation::to_history_turn)
        .collect();

    let reply = state
        .tutor
        .chat(&request.message, request.topic.as_deref(), &history)
        .await;

    let conversation = state
        .db
        .insert_conversation(request.user_id, None, &request.message, &reply.value)
        .await?;

    Ok(Json(ChatResponse {
        response: reply.value,
        conversation_id: conversation.id,
    }))
}
