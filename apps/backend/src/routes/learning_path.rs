//! Learning path endpoint

use axum::{extract::State, Json};

use crate::error::{require_non_empty, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/learning-path
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<LearningPathRequest>,
) -> Result<Json<LearningPathResponse>> {
    require_non_empty("subject", &request.subject)?;

    let reply = state
        .tutor
        .learning_path(&request.subject, &request.current_level, request.goals.as_deref())
        .await;

    Ok(Json(LearningPathResponse {
        subject: request.subject,
        level: request.current_level,
        total_topics: reply.value.len(),
        topics: reply.value,
    }))
}
