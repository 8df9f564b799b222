#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use popchoice_api::{
    error::{AppError, AppResult},
    models::ContentChunk,
    services::{
        providers::ChatRequest, ChatModel, Embedder, InMemoryVectorStore, PipelineOrchestrator,
        PipelineSettings, PosterResolver, Recommender, VectorStore,
    },
};

pub const HEIST_CHUNK: &str = "Ocean's Eleven: 2001 | PG-13 | 1h 56m | 7.7 rating Danny Ocean assembles a crew to rob three Las Vegas casinos in one night.";

pub const HEIST_REPLY: &str = r#"{"title":"Ocean's Eleven","content":"Danny Ocean and a crew of specialists rob three Las Vegas casinos on the night of a boxing match.","releaseYear":"2001"}"#;

pub const SENTINEL_REPLY: &str = r#"{"title":"No movies found","content":"Sorry, no movies found for your query. Please try again."}"#;

pub const POSTER_URL: &str = "https://image.tmdb.org/t/p/w500/oceans.jpg";

/// Maps every text to the same unit vector, except texts containing the
/// poison phrase, which fail
pub struct FakeEmbedder {
    pub poison: Option<&'static str>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self { poison: None }
    }

    pub fn failing_on(poison: &'static str) -> Self {
        Self {
            poison: Some(poison),
        }
    }

    fn vector_for(&self, text: &str) -> AppResult<Vec<f32>> {
        match self.poison {
            Some(poison) if text.contains(poison) => Err(AppError::Embedding(format!(
                "Provider rejected input containing {:?}",
                poison
            ))),
            _ => Ok(vec![0.6, 0.8, 0.0]),
        }
    }
}

#[async_trait::async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.vector_for(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.vector_for(text)).collect()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Replies with a canned answer and remembers every request it saw
pub struct FakeChatModel {
    reply: &'static str,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatModel {
    pub fn replying(reply: &'static str) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|request| request.messages.last())
            .map(|message| message.content.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(&self, request: &ChatRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.to_string())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakePosterResolver {
    poster: Option<&'static str>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakePosterResolver {
    pub fn with_poster(poster: &'static str) -> Self {
        Self {
            poster: Some(poster),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl PosterResolver for FakePosterResolver {
    async fn resolve_poster(&self, title: &str) -> Option<String> {
        self.lookups.lock().unwrap().push(title.to_string());
        self.poster.map(str::to_string)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct Pipeline {
    pub orchestrator: PipelineOrchestrator,
    pub store: Arc<InMemoryVectorStore>,
    pub chat: Arc<FakeChatModel>,
    pub posters: Arc<FakePosterResolver>,
}

/// Builds a pipeline over an in-memory store, optionally seeded with the
/// heist chunk under the same vector the fake embedder produces
pub async fn pipeline(embedder: FakeEmbedder, reply: &'static str, seeded: bool) -> Pipeline {
    let store = Arc::new(InMemoryVectorStore::new());
    if seeded {
        store
            .ingest(&[ContentChunk::new(HEIST_CHUNK, vec![0.6, 0.8, 0.0])])
            .await
            .unwrap();
    }

    let chat = Arc::new(FakeChatModel::replying(reply));
    let posters = Arc::new(FakePosterResolver::with_poster(POSTER_URL));

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(embedder),
        store.clone(),
        Arc::new(Recommender::new(chat.clone(), "gpt-5-chat-latest")),
        posters.clone(),
        PipelineSettings::default(),
    );

    Pipeline {
        orchestrator,
        store,
        chat,
        posters,
    }
}
