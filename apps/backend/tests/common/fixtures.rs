//! Test fixtures and factory functions for creating test data.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

use learning_platform_backend::models::{CreateCourseRequest, CreateTopicRequest};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name that is unique across test runs and within this process.
pub fn unique_name(prefix: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}_{}", prefix, std::process::id(), nanos, n)
}

/// Model reply in the labeled problem format.
pub fn problem_reply(question: &str, solution: &str, hints: &[&str]) -> String {
    format!(
        "QUESTION: {}\nSOLUTION: {}\nHINTS: {}",
        question,
        solution,
        hints.join(";")
    )
}

/// Model reply in the labeled assessment format.
pub fn assessment_reply(correct: &str, score: i32, feedback: &str) -> String {
    format!("CORRECT: {}\nSCORE: {}\nFEEDBACK: {}", correct, score, feedback)
}

pub fn create_user_request(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
    })
}

pub fn chat_request(user_id: i64, message: &str, topic: Option<&str>) -> Value {
    json!({
        "user_id": user_id,
        "message": message,
        "topic": topic,
    })
}

pub fn generate_request(topic: &str, difficulty: f64, topic_id: Option<i64>) -> Value {
    json!({
        "topic": topic,
        "difficulty": difficulty,
        "topic_id": topic_id,
    })
}

pub fn submit_request(user_id: i64, problem_id: i64, answer: &str) -> Value {
    json!({
        "user_id": user_id,
        "problem_id": problem_id,
        "answer": answer,
    })
}

pub fn assess_direct_request(user_id: i64, topic_name: &str, answer: &str) -> Value {
    json!({
        "user_id": user_id,
        "topic_name": topic_name,
        "question": "What is 2 + 2?",
        "answer": answer,
        "solution": "4",
    })
}

pub fn course_request(title: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        title: title.to_string(),
        subject: "Mathematics".to_string(),
        difficulty_level: Some("beginner".to_string()),
        description: None,
    }
}

pub fn topic_request(title: &str, order: Option<i32>) -> CreateTopicRequest {
    CreateTopicRequest {
        title: title.to_string(),
        order,
        prerequisites: None,
        description: None,
    }
}
