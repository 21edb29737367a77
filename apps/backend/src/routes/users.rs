//! User endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{require_non_empty, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    require_non_empty("username", &request.username)?;
    require_non_empty("email", &request.email)?;

    let user = state.db.create_user(&request.username, &request.email).await?;
    tracing::info!(user_id = user.id, "Created user");

    Ok(Json(CreateUserResponse {
        user_id: user.id,
        username: user.username,
    }))
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = state.db.require_user(user_id).await?;
    Ok(Json(user.into()))
}

/// GET /api/users/:id/progress
pub async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProgressResponse>> {
    state.db.require_user(user_id).await?;

    let progress: Vec<TopicProgress> = state
        .db
        .get_progress_for_user(user_id)
        .await?
        .iter()
        .map(|row| row.to_api_progress())
        .collect();

    Ok(Json(UserProgressResponse {
        user_id,
        topics_in_progress: progress.len(),
        progress,
    }))
}
