//! OpenAI provider
//!
//! One client serves both the embeddings endpoint (`/embeddings`) and the
//! chat completions endpoint (`/chat/completions`). Any OpenAI-compatible
//! base URL works.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::providers::{describe_failure, ChatModel, ChatRequest, Embedder},
};

#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        api_url: String,
        embedding_model: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            embedding_model,
        })
    }

    /// Puts the embedding items back in input order and checks nothing is missing
    fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        if data.len() != expected {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, received {}",
                expected,
                data.len()
            )));
        }

        data.sort_by_key(|item| item.index);

        let mut vectors = Vec::with_capacity(expected);
        for (position, item) in data.into_iter().enumerate() {
            if item.index != position {
                return Err(AppError::Embedding(format!(
                    "Embedding response is missing index {}",
                    position
                )));
            }
            if item.embedding.is_empty() {
                return Err(AppError::Embedding(format!(
                    "Embedding at index {} is empty",
                    position
                )));
            }
            vectors.push(item.embedding);
        }

        Ok(vectors)
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(AppError::Embedding(
                "Embedding input cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.api_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Embedding(
                describe_failure("OpenAI embeddings", response).await,
            ));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse embeddings: {}", e)))?;

        let vectors = Self::order_embeddings(body.data, texts.len())?;

        tracing::debug!(
            inputs = texts.len(),
            dims = vectors.first().map(Vec::len).unwrap_or(0),
            model = %self.embedding_model,
            provider = "openai",
            "Embeddings created"
        );

        Ok(vectors)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);

        tracing::debug!(model = %request.model, provider = "openai", "Chat completion request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Completion(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Completion(
                describe_failure("OpenAI chat", response).await,
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Completion(format!("Failed to parse completion: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Completion("No response content from OpenAI".to_string()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
