//! Chat-completion client for an OpenAI-compatible hosted model.
//!
//! Calls never fail outright. Every outcome is reported as a [`Completion`]
//! so callers can tell model output apart from timeouts and upstream
//! errors, and can still fall back to placeholder text with
//! [`Completion::into_text`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tutor_core::OutputFormat;

use crate::config::CompletionConfig;

pub const TEMPERATURE: f32 = 0.9;
pub const TOP_P: f32 = 0.95;
pub const MAX_TOKENS: u32 = 800;

/// Placeholder returned in place of model output after a timeout.
pub const TIMEOUT_MESSAGE: &str =
    "The AI is taking too long to respond. Please try a simpler question.";

/// Outcome of one completion call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Text of the first choice.
    Content(String),
    /// The request exceeded the configured timeout.
    TimedOut,
    /// Transport failure, non-2xx status or undecodable body.
    Upstream(String),
}

/// Coarse completion outcome for logging and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Ok,
    TimedOut,
    Failed,
}

impl Completion {
    pub fn status(&self) -> CompletionStatus {
        match self {
            Self::Content(_) => CompletionStatus::Ok,
            Self::TimedOut => CompletionStatus::TimedOut,
            Self::Upstream(_) => CompletionStatus::Failed,
        }
    }

    /// Model text, or the placeholder shown to users when the call failed.
    pub fn into_text(self) -> String {
        match self {
            Self::Content(text) => text,
            Self::TimedOut => TIMEOUT_MESSAGE.to_string(),
            Self::Upstream(error) => format!("Error communicating with AI: {}", error),
        }
    }
}

/// Text completion collaborator.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a user prompt with an optional system instruction.
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Completion;

    /// Whether credentials for the upstream service are present.
    fn is_configured(&self) -> bool;
}

#[derive(Debug, Error)]
enum CompletionError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("completion client is shutting down")]
    Closed,

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Http(reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("response contained no choices")]
    NoChoices,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Http(err)
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for `POST {base_url}/chat/completions`.
pub struct CompletionClient {
    http: Client,
    config: CompletionConfig,
    permits: Semaphore,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let permits = Semaphore::new(config.max_concurrency);

        Ok(Self {
            http,
            config,
            permits,
        })
    }

    async fn send(&self, prompt: &str, system: Option<&str>) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        // The timeout covers waiting for a permit as well as the request.
        tokio::time::timeout(self.config.timeout, self.request(api_key, prompt, system))
            .await
            .map_err(|_| CompletionError::Timeout)?
    }

    async fn request(
        &self,
        api_key: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, CompletionError> {
        let _permit = self.permits.acquire().await.map_err(|_| CompletionError::Closed)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            response_format: match self.config.output_format {
                OutputFormat::Json => Some(ResponseFormat { kind: "json_object" }),
                OutputFormat::Labeled => None,
            },
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let data: ChatCompletionResponse = response.json().await?;
        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(CompletionError::NoChoices)
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Completion {
        match self.send(prompt, system).await {
            Ok(text) => Completion::Content(text),
            Err(CompletionError::Timeout) => {
                tracing::warn!(
                    "Completion request timed out after {:?}",
                    self.config.timeout
                );
                Completion::TimedOut
            }
            Err(e) => {
                tracing::warn!("Completion request failed: {}", e);
                Completion::Upstream(e.to_string())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}
