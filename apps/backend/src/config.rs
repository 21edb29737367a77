//! Runtime configuration read from the environment.
//!
//! Variables (a `.env` file is loaded first when present):
//! - DATABASE_URL: PostgreSQL connection string (required)
//! - DATABASE_SSL_MODE: disable | allow | prefer | require | verify-ca | verify-full (default: require)
//! - DATABASE_MAX_CONNECTIONS: pool size (default: 10)
//! - HOST / PORT: listen address (default: 0.0.0.0:8000)
//! - CORS_ALLOWED_ORIGINS: comma separated origins
//! - GROQ_API_KEY: bearer token for the completion service
//! - COMPLETION_BASE_URL, COMPLETION_MODEL: completion endpoint and model
//! - COMPLETION_TIMEOUT_SECS: upstream request timeout (default: 180)
//! - COMPLETION_MAX_CONCURRENCY: in-flight upstream calls (default: 16)
//! - COMPLETION_STRUCTURED_OUTPUT: ask for JSON output (default: false)

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgSslMode;
use thiserror::Error;
use tutor_core::OutputFormat;

pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama-3.3-70b-versatile";

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Normalized connection string.
    pub url: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub output_format: OutputFormat,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            timeout: Duration::from_secs(180),
            max_concurrency: 16,
            output_format: OutputFormat::Labeled,
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let ssl_mode = match get("DATABASE_SSL_MODE") {
            Some(mode) => PgSslMode::from_str(mode.trim()).map_err(|_| ConfigError::Invalid {
                key: "DATABASE_SSL_MODE",
                value: mode,
            })?,
            None => PgSslMode::Require,
        };

        let database = DatabaseConfig {
            url: normalize_database_url(&database_url),
            ssl_mode,
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8000)?,
            cors_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };

        let structured = parse_or(
            get("COMPLETION_STRUCTURED_OUTPUT"),
            "COMPLETION_STRUCTURED_OUTPUT",
            false,
        )?;

        let defaults = CompletionConfig::default();
        let completion = CompletionConfig {
            api_key: get("GROQ_API_KEY"),
            base_url: get("COMPLETION_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: get("COMPLETION_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(parse_or(
                get("COMPLETION_TIMEOUT_SECS"),
                "COMPLETION_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            max_concurrency: parse_or(
                get("COMPLETION_MAX_CONCURRENCY"),
                "COMPLETION_MAX_CONCURRENCY",
                defaults.max_concurrency,
            )?
            .max(1),
            output_format: if structured {
                OutputFormat::Json
            } else {
                OutputFormat::Labeled
            },
        };

        Ok(Self {
            database,
            server,
            completion,
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Normalize a connection string for sqlx.
///
/// Driver suffixes such as `postgresql+asyncpg://` are dropped and query
/// parameters are stripped; TLS is configured through `DATABASE_SSL_MODE`.
pub fn normalize_database_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('?').next().unwrap_or(url);

    match url.split_once("://") {
        Some((scheme, rest)) => {
            let scheme = scheme.split('+').next().unwrap_or(scheme);
            format!("{}://{}", scheme, rest)
        }
        None => url.to_string(),
    }
}
