//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring the router to a database and a scripted tutor
//! - ScriptedCompletion, a completion service that replays queued replies
//!
//! # Requirements
//! Tests built with `TestContext::new` require a PostgreSQL database (set
//! DATABASE_URL). `TestContext::new_lazy` never opens a connection and only
//! suits endpoints that do not touch the database.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use sqlx::postgres::PgSslMode;

use learning_platform_backend::build_router;
use learning_platform_backend::config::{normalize_database_url, DatabaseConfig};
use learning_platform_backend::db::Database;
use learning_platform_backend::services::completion::{Completion, CompletionService};
use learning_platform_backend::services::tutor::TutorService;
use learning_platform_backend::AppState;
use tutor_core::OutputFormat;

/// Reply used once the queue is empty.
pub const DEFAULT_REPLY: &str = "Let's think about this together. What do you notice first?";

/// Completion service that replays queued outcomes in order and records
/// every prompt it receives.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Completion>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn push(&self, completion: Completion) {
        self.replies.lock().unwrap().push_back(completion);
    }

    pub fn push_text(&self, text: &str) {
        self.push(Completion::Content(text.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, _system: Option<&str>) -> Completion {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Completion::Content(DEFAULT_REPLY.to_string()))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Test context containing the database handle, the scripted completion
/// service and the application router.
pub struct TestContext {
    pub db: Arc<Database>,
    pub completion: Arc<ScriptedCompletion>,
    app: Router,
}

impl TestContext {
    /// Create a test context against a real database.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
        let ssl_mode = std::env::var("DATABASE_SSL_MODE")
            .ok()
            .and_then(|mode| mode.parse().ok())
            .unwrap_or(PgSslMode::Prefer);

        let config = DatabaseConfig {
            url: normalize_database_url(&database_url),
            ssl_mode,
            max_connections: 5,
        };

        let db = Database::connect(&config)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::with_database(db)
    }

    /// Create a test context whose pool never connects.
    pub fn new_lazy() -> Self {
        let config = DatabaseConfig {
            url: "postgres://postgres@127.0.0.1:1/unused".to_string(),
            ssl_mode: PgSslMode::Disable,
            max_connections: 1,
        };
        let db = Database::connect_lazy(&config).expect("Failed to build lazy pool");

        Self::with_database(db)
    }

    fn with_database(db: Database) -> Self {
        let db = Arc::new(db);
        let completion = Arc::new(ScriptedCompletion::default());
        let tutor = TutorService::new(completion.clone(), OutputFormat::Labeled);

        let state = AppState {
            db: db.clone(),
            tutor: Arc::new(tutor),
        };
        let app = build_router(state, &["http://localhost:3000".to_string()]);

        Self { db, completion, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a user with a unique name and return its ID.
    pub async fn create_test_user(&self) -> i64 {
        let username = fixtures::unique_name("student");
        let email = format!("{}@example.com", username);
        self.db
            .create_user(&username, &email)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Create a course with one topic and return (course_id, topic_id).
    pub async fn create_test_topic(&self, title: &str) -> (i64, i64) {
        let course = self
            .db
            .create_course(&fixtures::course_request("Algebra I"))
            .await
            .expect("Failed to create test course");
        let topic = self
            .db
            .create_topic(course.id, &fixtures::topic_request(title, None))
            .await
            .expect("Failed to create test topic");
        (course.id, topic.id)
    }

    /// Clean up test data for a user.
    pub async fn cleanup_user(&self, user_id: i64) {
        // Delete in order due to foreign keys
        for sql in [
            "DELETE FROM progress WHERE user_id = $1",
            "DELETE FROM conversations WHERE user_id = $1",
            "DELETE FROM users WHERE id = $1",
        ] {
            let _ = sqlx::query(sql).bind(user_id).execute(self.db.pool()).await;
        }
    }

    /// Clean up a course with its topics and problems.
    ///
    /// Users referencing the topics must be cleaned up first.
    pub async fn cleanup_course(&self, course_id: i64) {
        for sql in [
            "DELETE FROM problems WHERE topic_id IN (SELECT id FROM topics WHERE course_id = $1)",
            "DELETE FROM topics WHERE course_id = $1",
            "DELETE FROM courses WHERE id = $1",
        ] {
            let _ = sqlx::query(sql).bind(course_id).execute(self.db.pool()).await;
        }
    }
}
