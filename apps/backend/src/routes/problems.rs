//! Practice problem endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use tutor_core::{DifficultyLevel, SOLUTION_FAILED};

use crate::error::{require_non_empty, ApiError, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/problems/generate
///
/// With a `topic_id` the problem is stored and its id returned for later
/// submission. Degraded or unparseable generations are never stored.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateProblemRequest>,
) -> Result<Json<GenerateProblemResponse>> {
    require_non_empty("topic", &request.topic)?;
    // Checked here too so a bad difficulty is rejected before the topic lookup.
    DifficultyLevel::from_score(request.difficulty)?;

    if let Some(topic_id) = request.topic_id {
        if state.db.get_topic(topic_id).await?.is_none() {
            return Err(ApiError::NotFound("Topic not found".to_string()));
        }
    }

    let reply = state
        .tutor
        .generate_problem(&request.topic, request.difficulty, &request.problem_type)
        .await?;
    let problem = &reply.value;

    let storable = !reply.is_degraded() && problem.solution != SOLUTION_FAILED;
    let problem_id = match request.topic_id {
        Some(topic_id) if storable => {
            let stored = state
                .db
                .create_problem(&NewProblem {
                    topic_id,
                    question: &problem.question,
                    difficulty: request.difficulty,
                    problem_type: &request.problem_type,
                    solution: &problem.solution,
                    hints: problem.joined_hints(),
                })
                .await?;
            Some(stored.id)
        }
        Some(topic_id) => {
            tracing::warn!(topic_id, "Generated problem not stored");
            None
        }
        None => None,
    };

    Ok(Json(GenerateProblemResponse {
        question: reply.value.question,
        hints: reply.value.hints,
        topic: request.topic,
        difficulty: request.difficulty,
        problem_id,
    }))
}

/// GET /api/problems/:id
pub async fn get(
    State(state): State<AppState>,
    Path(problem_id): Path<i64>,
) -> Result<Json<ProblemResponse>> {
    let problem = state
        .db
        .get_problem(problem_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))?;

    Ok(Json(problem.to_api_problem()))
}

/// POST /api/problems/submit
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>> {
    let problem = state
        .db
        .get_problem(request.problem_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Problem not found".to_string()))?;
    state.db.require_user(request.user_id).await?;

    let reply = state
        .tutor
        .assess_answer(&problem.question, &problem.solution, &request.answer)
        .await;

    let progress = state
        .db
        .record_attempt(
            request.user_id,
            ProgressKey::Topic(problem.topic_id),
            reply.value.is_correct,
        )
        .await?;
    tracing::debug!(
        user_id = request.user_id,
        topic_id = problem.topic_id,
        attempted = progress.problems_attempted,
        "Recorded attempt"
    );

    Ok(Json(SubmitAnswerResponse {
        assessment: reply.value,
        progress_updated: true,
    }))
}

/// POST /api/problems/assess-direct
pub async fn assess_direct(
    State(state): State<AppState>,
    Json(request): Json<DirectAssessRequest>,
) -> Result<Json<DirectAssessResponse>> {
    require_non_empty("topic_name", &request.topic_name)?;
    state.db.require_user(request.user_id).await?;

    let reply = state
        .tutor
        .assess_answer(&request.question, &request.solution, &request.answer)
        .await;

    state
        .db
        .record_attempt(
            request.user_id,
            ProgressKey::TopicName(&request.topic_name),
            reply.value.is_correct,
        )
        .await?;

    Ok(Json(DirectAssessResponse {
        assessment: reply.value,
    }))
}
