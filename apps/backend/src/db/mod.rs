//! PostgreSQL database operations

use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::config::DatabaseConfig;
use crate::error::{ApiError, Result};
use crate::models::*;
use tutor_core::MasteryCounters;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(Self::connect_options(config)?)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that only opens connections when first used
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(Self::connect_options(config)?);

        Ok(Self { pool })
    }

    fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
        Ok(PgConnectOptions::from_str(&config.url)?.ssl_mode(config.ssl_mode))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that the database answers a trivial query
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // === User Repository ===

    /// Create a new user
    pub async fn create_user(&self, username: &str, email: &str) -> Result<DbUser> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: i64) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID or fail with not found
    pub async fn require_user(&self, user_id: i64) -> Result<DbUser> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    // === Course Repository ===

    /// Create a new course
    pub async fn create_course(&self, request: &CreateCourseRequest) -> Result<DbCourse> {
        let course = sqlx::query_as::<_, DbCourse>(
            r#"
            INSERT INTO courses (title, subject, difficulty_level, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, subject, difficulty_level, description
            "#,
        )
        .bind(&request.title)
        .bind(&request.subject)
        .bind(&request.difficulty_level)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    /// Get all courses
    pub async fn get_courses(&self) -> Result<Vec<DbCourse>> {
        let courses = sqlx::query_as::<_, DbCourse>(
            r#"
            SELECT id, title, subject, difficulty_level, description
            FROM courses
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Get course by ID
    pub async fn get_course(&self, course_id: i64) -> Result<Option<DbCourse>> {
        let course = sqlx::query_as::<_, DbCourse>(
            r#"
            SELECT id, title, subject, difficulty_level, description
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    // === Topic Repository ===

    /// Create a topic under a course.
    ///
    /// Without an explicit order the topic is appended after the last one.
    pub async fn create_topic(&self, course_id: i64, request: &CreateTopicRequest) -> Result<DbTopic> {
        let topic = sqlx::query_as::<_, DbTopic>(
            r#"
            INSERT INTO topics (course_id, title, "order", prerequisites, description)
            VALUES (
                $1, $2,
                COALESCE($3, (SELECT COALESCE(MAX("order"), 0) + 1 FROM topics WHERE course_id = $1)),
                $4, $5
            )
            RETURNING id, course_id, title, "order", prerequisites, description
            "#,
        )
        .bind(course_id)
        .bind(&request.title)
        .bind(request.order)
        .bind(&request.prerequisites)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Get topic by ID
    pub async fn get_topic(&self, topic_id: i64) -> Result<Option<DbTopic>> {
        let topic = sqlx::query_as::<_, DbTopic>(
            r#"
            SELECT id, course_id, title, "order", prerequisites, description
            FROM topics
            WHERE id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    /// Get the topics of a course in learning order
    pub async fn get_topics_for_course(&self, course_id: i64) -> Result<Vec<DbTopic>> {
        let topics = sqlx::query_as::<_, DbTopic>(
            r#"
            SELECT id, course_id, title, "order", prerequisites, description
            FROM topics
            WHERE course_id = $1
            ORDER BY "order", id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    // === Problem Repository ===

    /// Store a generated problem
    pub async fn create_problem(&self, problem: &NewProblem<'_>) -> Result<DbProblem> {
        let problem = sqlx::query_as::<_, DbProblem>(
            r#"
            INSERT INTO problems (topic_id, question, difficulty, problem_type, solution, hints)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, topic_id, question, difficulty, problem_type, solution, hints
            "#,
        )
        .bind(problem.topic_id)
        .bind(problem.question)
        .bind(problem.difficulty)
        .bind(problem.problem_type)
        .bind(problem.solution)
        .bind(&problem.hints)
        .fetch_one(&self.pool)
        .await?;

        Ok(problem)
    }

    /// Get problem by ID
    pub async fn get_problem(&self, problem_id: i64) -> Result<Option<DbProblem>> {
        let problem = sqlx::query_as::<_, DbProblem>(
            r#"
            SELECT id, topic_id, question, difficulty, problem_type, solution, hints
            FROM problems
            WHERE id = $1
            "#,
        )
        .bind(problem_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(problem)
    }

    // === Progress Repository ===

    /// Record one graded attempt for a user and topic.
    ///
    /// A single upsert statement: the first attempt inserts the row, later
    /// attempts increment the counters and recompute mastery in place, so
    /// concurrent submissions for the same key are all counted.
    pub async fn record_attempt(
        &self,
        user_id: i64,
        key: ProgressKey<'_>,
        is_correct: bool,
    ) -> Result<DbProgress> {
        let first = MasteryCounters::default().record(is_correct);

        let progress = match key {
            ProgressKey::Topic(topic_id) => {
                sqlx::query_as::<_, DbProgress>(
                    r#"
                    INSERT INTO progress (user_id, topic_id, problems_attempted, problems_correct,
                                          mastery_level, last_practiced)
                    VALUES ($1, $2, $3, $4, $5, NOW())
                    ON CONFLICT (user_id, topic_id) WHERE topic_id IS NOT NULL DO UPDATE SET
                        problems_attempted = progress.problems_attempted + 1,
                        problems_correct = progress.problems_correct + EXCLUDED.problems_correct,
                        mastery_level = (progress.problems_correct + EXCLUDED.problems_correct)::FLOAT8
                                        / (progress.problems_attempted + 1),
                        last_practiced = NOW()
                    RETURNING id, user_id, topic_id, topic_name, mastery_level,
                              problems_attempted, problems_correct, last_practiced
                    "#,
                )
                .bind(user_id)
                .bind(topic_id)
                .bind(first.attempted)
                .bind(first.correct)
                .bind(first.mastery_level())
                .fetch_one(&self.pool)
                .await?
            }
            ProgressKey::TopicName(topic_name) => {
                sqlx::query_as::<_, DbProgress>(
                    r#"
                    INSERT INTO progress (user_id, topic_name, problems_attempted, problems_correct,
                                          mastery_level, last_practiced)
                    VALUES ($1, $2, $3, $4, $5, NOW())
                    ON CONFLICT (user_id, topic_name) WHERE topic_name IS NOT NULL DO UPDATE SET
                        problems_attempted = progress.problems_attempted + 1,
                        problems_correct = progress.problems_correct + EXCLUDED.problems_correct,
                        mastery_level = (progress.problems_correct + EXCLUDED.problems_correct)::FLOAT8
                                        / (progress.problems_attempted + 1),
                        last_practiced = NOW()
                    RETURNING id, user_id, topic_id, topic_name, mastery_level,
                              problems_attempted, problems_correct, last_practiced
                    "#,
                )
                .bind(user_id)
                .bind(topic_name)
                .bind(first.attempted)
                .bind(first.correct)
                .bind(first.mastery_level())
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(progress)
    }

    /// Get all progress rows for a user with their topic titles
    pub async fn get_progress_for_user(&self, user_id: i64) -> Result<Vec<DbProgressWithTopic>> {
        let rows = sqlx::query_as::<_, DbProgressWithTopic>(
            r#"
            SELECT p.id, p.user_id, p.topic_id, p.topic_name, p.mastery_level,
                   p.problems_attempted, p.problems_correct, p.last_practiced,
                   t.title as topic_title
            FROM progress p
            LEFT JOIN topics t ON p.topic_id = t.id
            WHERE p.user_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === Conversation Repository ===

    /// Append a chat turn
    pub async fn insert_conversation(
        &self,
        user_id: i64,
        topic_id: Option<i64>,
        message: &str,
        response: &str,
    ) -> Result<DbConversation> {
        let conversation = sqlx::query_as::<_, DbConversation>(
            r#"
            INSERT INTO conversations (user_id, topic_id, message, response)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, topic_id, message, response, timestamp
            "#,
        )
        .bind(user_id)
        .bind(topic_id)
        .bind(message)
        .bind(response)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    /// Get the most recent chat turns for a user, oldest first
    pub async fn get_recent_conversations(&self, user_id: i64, limit: i64) -> Result<Vec<DbConversation>> {
        let mut conversations = sqlx::query_as::<_, DbConversation>(
            r#"
            SELECT id, user_id, topic_id, message, response, timestamp
            FROM conversations
            WHERE user_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        conversations.reverse();
        Ok(conversations)
    }
}
