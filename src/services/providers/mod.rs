//! External provider abstractions
//!
//! Every network-backed collaborator of the recommendation pipeline sits
//! behind one of these traits so the orchestrator can be built from real
//! clients in production and from fakes in tests.

use serde::Serialize;

use crate::error::AppResult;

pub mod openai;
pub mod tmdb;

pub use openai::OpenAiClient;
pub use tmdb::TmdbPosterResolver;

/// Turns text into a dense vector
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single non-empty text
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embeds many texts in one request
    ///
    /// The returned vectors are in the same order as `texts`.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

/// Chat completion provider
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the request and returns the text of the first reply
    async fn complete(&self, request: &ChatRequest) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// Looks up a poster image for a movie title
///
/// Lookups never fail from the caller's point of view: anything that goes
/// wrong is logged and reported as a missing poster.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterResolver: Send + Sync {
    async fn resolve_poster(&self, title: &str) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// Reads a non-success response into an error message
pub(crate) async fn describe_failure(provider: &str, response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("{} API returned status {}: {}", provider, status, body)
}
