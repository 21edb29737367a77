//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use tutor_core::types::{Assessment, GeneratedProblem, HistoryTurn};
use tutor_core::{accuracy_percent, MasteryCounters};

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCourse {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub difficulty_level: Option<String>,
    pub description: Option<String>,
}

/// Topic within a course, ordered by `order`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTopic {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub order: i32,
    pub prerequisites: Option<String>,
    pub description: Option<String>,
}

/// Stored practice problem. Hints are semicolon-joined.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProblem {
    pub id: i64,
    pub topic_id: i64,
    pub question: String,
    pub difficulty: f64,
    pub problem_type: String,
    pub solution: String,
    pub hints: String,
}

impl DbProblem {
    /// Split stored hints back into a list
    pub fn hint_list(&self) -> Vec<String> {
        self.hints
            .split(';')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Public view without the reference solution
    pub fn to_api_problem(&self) -> ProblemResponse {
        ProblemResponse {
            id: self.id,
            topic_id: self.topic_id,
            question: self.question.clone(),
            difficulty: self.difficulty,
            problem_type: self.problem_type.clone(),
            hints: self.hint_list(),
        }
    }
}

/// New problem row to insert
#[derive(Debug, Clone)]
pub struct NewProblem<'a> {
    pub topic_id: i64,
    pub question: &'a str,
    pub difficulty: f64,
    pub problem_type: &'a str,
    pub solution: &'a str,
    pub hints: String,
}

/// Progress row keyed by topic id or free-form topic name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProgress {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: Option<i64>,
    pub topic_name: Option<String>,
    pub mastery_level: f64,
    pub problems_attempted: i32,
    pub problems_correct: i32,
    pub last_practiced: DateTime<Utc>,
}

impl DbProgress {
    pub fn counters(&self) -> MasteryCounters {
        MasteryCounters::new(self.problems_attempted, self.problems_correct)
    }
}

/// Progress row joined with the title of its topic, if any
#[derive(Debug, Clone, FromRow)]
pub struct DbProgressWithTopic {
    #[sqlx(flatten)]
    pub progress: DbProgress,
    pub topic_title: Option<String>,
}

impl DbProgressWithTopic {
    /// Convert to API progress entry
    pub fn to_api_progress(&self) -> TopicProgress {
        let p = &self.progress;
        let topic_name = p
            .topic_name
            .clone()
            .or_else(|| self.topic_title.clone())
            .or_else(|| p.topic_id.map(|id| format!("Topic {}", id)))
            .unwrap_or_else(|| "Unknown".to_string());

        TopicProgress {
            topic_id: p.topic_id,
            topic_name,
            mastery_level: p.mastery_level,
            problems_attempted: p.problems_attempted,
            problems_correct: p.problems_correct,
            accuracy: accuracy_percent(p.counters()),
            last_practiced: p.last_practiced,
        }
    }
}

/// Key identifying one progress aggregate for a user
#[derive(Debug, Clone, Copy)]
pub enum ProgressKey<'a> {
    /// Persisted topic of a stored problem
    Topic(i64),
    /// Free-form topic name of an on-the-fly problem
    TopicName(&'a str),
}

/// One chat turn
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbConversation {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: Option<i64>,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl DbConversation {
    pub fn to_history_turn(&self) -> HistoryTurn {
        HistoryTurn {
            question: self.message.clone(),
            answer: self.response.clone(),
        }
    }
}

// === API Request/Response Types ===

// User types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUser> for UserResponse {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

// Chat types
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: i64,
    pub message: String,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: i64,
}

// Problem types
fn default_difficulty() -> f64 {
    5.0
}

fn default_problem_type() -> String {
    "open_ended".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateProblemRequest {
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    #[serde(default = "default_problem_type")]
    pub problem_type: String,
    /// Store the generated problem under this topic
    pub topic_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateProblemResponse {
    pub question: String,
    pub hints: Vec<String>,
    pub topic: String,
    pub difficulty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemResponse {
    pub id: i64,
    pub topic_id: i64,
    pub question: String,
    pub difficulty: f64,
    pub problem_type: String,
    pub hints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub user_id: i64,
    pub problem_id: i64,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub assessment: Assessment,
    pub progress_updated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectAssessRequest {
    pub user_id: i64,
    pub topic_name: String,
    pub question: String,
    pub answer: String,
    pub solution: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectAssessResponse {
    pub assessment: Assessment,
}

// Learning path types
fn default_level() -> String {
    "beginner".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearningPathRequest {
    pub subject: String,
    #[serde(default = "default_level")]
    pub current_level: String,
    pub goals: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearningPathResponse {
    pub subject: String,
    pub level: String,
    pub topics: Vec<String>,
    pub total_topics: usize,
}

// Progress types
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic_id: Option<i64>,
    pub topic_name: String,
    pub mastery_level: f64,
    pub problems_attempted: i32,
    pub problems_correct: i32,
    pub accuracy: f64,
    pub last_practiced: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProgressResponse {
    pub user_id: i64,
    pub topics_in_progress: usize,
    pub progress: Vec<TopicProgress>,
}

// Course types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub subject: String,
    pub difficulty_level: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub order: Option<i32>,
    pub prerequisites: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseListResponse {
    pub courses: Vec<DbCourse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: DbCourse,
    pub topics: Vec<DbTopic>,
}

// Service info types
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub ai_service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(topic_id: Option<i64>, topic_name: Option<&str>, attempted: i32, correct: i32) -> DbProgress {
        DbProgress {
            id: 1,
            user_id: 1,
            topic_id,
            topic_name: topic_name.map(str::to_string),
            mastery_level: MasteryCounters::new(attempted, correct).mastery_level(),
            problems_attempted: attempted,
            problems_correct: correct,
            last_practiced: Utc::now(),
        }
    }

    #[test]
    fn test_progress_prefers_free_form_name() {
        let row = DbProgressWithTopic {
            progress: progress(None, Some("Fractions"), 4, 3),
            topic_title: None,
        };
        let api = row.to_api_progress();
        assert_eq!(api.topic_name, "Fractions");
        assert_eq!(api.accuracy, 75.0);
        assert_eq!(api.mastery_level, 0.75);
    }

    #[test]
    fn test_progress_falls_back_to_topic_title_then_id() {
        let titled = DbProgressWithTopic {
            progress: progress(Some(7), None, 1, 1),
            topic_title: Some("Limits".to_string()),
        };
        assert_eq!(titled.to_api_progress().topic_name, "Limits");

        let untitled = DbProgressWithTopic {
            progress: progress(Some(7), None, 1, 0),
            topic_title: None,
        };
        assert_eq!(untitled.to_api_progress().topic_name, "Topic 7");
    }

    #[test]
    fn test_progress_without_attempts_has_zero_accuracy() {
        let row = DbProgressWithTopic {
            progress: progress(None, None, 0, 0),
            topic_title: None,
        };
        let api = row.to_api_progress();
        assert_eq!(api.topic_name, "Unknown");
        assert_eq!(api.accuracy, 0.0);
    }

    #[test]
    fn test_generate_request_defaults() {
        let request: GenerateProblemRequest =
            serde_json::from_str(r#"{"topic": "Linear Equations"}"#).unwrap();
        assert_eq!(request.difficulty, 5.0);
        assert_eq!(request.problem_type, "open_ended");
        assert_eq!(request.topic_id, None);
    }

    #[test]
    fn test_learning_path_request_defaults() {
        let request: LearningPathRequest = serde_json::from_str(r#"{"subject": "Python"}"#).unwrap();
        assert_eq!(request.current_level, "beginner");
        assert_eq!(request.goals, None);
    }

    #[test]
    fn test_problem_hint_list() {
        let problem = DbProblem {
            id: 1,
            topic_id: 2,
            question: "q".to_string(),
            difficulty: 4.0,
            problem_type: "open_ended".to_string(),
            solution: "s".to_string(),
            hints: "first; second;".to_string(),
        };
        assert_eq!(problem.hint_list(), vec!["first", "second"]);
        assert_eq!(problem.to_api_problem().hints.len(), 2);
    }
}
