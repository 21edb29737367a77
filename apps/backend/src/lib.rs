pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::models::HealthResponse;
use crate::services::completion::CompletionClient;
use crate::services::tutor::TutorService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tutor: Arc<TutorService>,
}

/// Build the API router with CORS and request tracing.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Users
        .route("/api/users", post(routes::users::create))
        .route("/api/users/:id", get(routes::users::get))
        .route("/api/users/:id/progress", get(routes::users::progress))
        // Tutoring
        .route("/api/chat", post(routes::chat::chat))
        .route("/api/learning-path", post(routes::learning_path::create))
        // Problems
        .route("/api/problems/generate", post(routes::problems::generate))
        .route("/api/problems/submit", post(routes::problems::submit))
        .route("/api/problems/assess-direct", post(routes::problems::assess_direct))
        .route("/api/problems/:id", get(routes::problems::get))
        // Courses
        .route(
            "/api/courses",
            get(routes::courses::list).post(routes::courses::create),
        )
        .route("/api/courses/:id", get(routes::courses::get))
        .route("/api/courses/:id/topics", post(routes::courses::create_topic))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    if config.completion.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set, tutoring responses will be degraded");
    }
    let format = config.completion.output_format;
    let completion = CompletionClient::new(config.completion.clone())?;
    let tutor = TutorService::new(Arc::new(completion), format);

    let db = Arc::new(db);
    let state = AppState {
        db: db.clone(),
        tutor: Arc::new(tutor),
    };

    let app = build_router(state, &config.server.cors_origins);

    let addr = config.server.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing database pool");
    db.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Personalized Learning Platform API",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "users": "/api/users",
            "chat": "/api/chat",
            "problems": "/api/problems",
            "learning-path": "/api/learning-path",
            "courses": "/api/courses"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_up = state.db.ping().await;

    Json(HealthResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        database: if database_up { "connected" } else { "unreachable" }.to_string(),
        ai_service: if state.tutor.is_configured() {
            "connected"
        } else {
            "missing key"
        }
        .to_string(),
    })
}
