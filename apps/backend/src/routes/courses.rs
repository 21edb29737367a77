//! Course catalogue endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{require_non_empty, ApiError, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/courses
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> Result<Json<DbCourse>> {
    require_non_empty("title", &request.title)?;
    require_non_empty("subject", &request.subject)?;

    let course = state.db.create_course(&request).await?;
    Ok(Json(course))
}

/// GET /api/courses
pub async fn list(State(state): State<AppState>) -> Result<Json<CourseListResponse>> {
    let courses = state.db.get_courses().await?;
    Ok(Json(CourseListResponse { courses }))
}

/// GET /api/courses/:id
pub async fn get(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseDetailResponse>> {
    let course = state
        .db
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    let topics = state.db.get_topics_for_course(course_id).await?;

    Ok(Json(CourseDetailResponse { course, topics }))
}

/// POST /api/courses/:id/topics
pub async fn create_topic(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(request): Json<CreateTopicRequest>,
) -> Result<Json<DbTopic>> {
    require_non_empty("title", &request.title)?;
    if state.db.get_course(course_id).await?.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let topic = state.db.create_topic(course_id, &request).await?;
    Ok(Json(topic))
}
