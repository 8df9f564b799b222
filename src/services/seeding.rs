//! One-time corpus seeding
//!
//! On startup, if the vector store is empty, the movie corpus is chunked,
//! embedded in a single batch and ingested. Two processes starting at the
//! same time can both see an empty store and seed twice; nothing guards
//! against that.

use std::path::Path;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::ContentChunk,
    services::{chunker::TextSplitter, providers::Embedder, vector_store::VectorStore},
};

/// One entry of the corpus file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CorpusMovie {
    /// Title line, e.g. "Oppenheimer: 2023 | R | 3h | 8.6 rating"
    pub title: String,
    pub content: String,
}

pub fn load_corpus(path: impl AsRef<Path>) -> AppResult<Vec<CorpusMovie>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Ingest(format!("Failed to read corpus {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::Ingest(format!("Failed to parse corpus {}: {}", path.display(), e))
    })
}

/// Flattens the corpus into the text that gets chunked
pub fn corpus_text(movies: &[CorpusMovie]) -> String {
    movies
        .iter()
        .map(|movie| format!("{} {}", movie.title.trim(), movie.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Seeds the store if it has no rows yet
///
/// Returns the number of chunks ingested, zero when the store was already
/// populated.
pub async fn seed_if_empty(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    splitter: &TextSplitter,
    movies: &[CorpusMovie],
) -> AppResult<usize> {
    if !store.is_empty().await? {
        tracing::info!(store = store.name(), "Vector store already seeded");
        return Ok(0);
    }

    tracing::info!(
        store = store.name(),
        movies = movies.len(),
        "Vector store is empty, seeding"
    );

    let texts = splitter.split_text(&corpus_text(movies));
    if texts.is_empty() {
        return Err(AppError::Ingest("Corpus produced no chunks".to_string()));
    }

    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != texts.len() {
        return Err(AppError::Ingest(format!(
            "Got {} embeddings for {} chunks",
            embeddings.len(),
            texts.len()
        )));
    }

    let chunks: Vec<ContentChunk> = texts
        .into_iter()
        .zip(embeddings)
        .map(|(content, embedding)| ContentChunk::new(content, embedding))
        .collect();

    store.ingest(&chunks).await?;

    tracing::info!(chunks = chunks.len(), store = store.name(), "Seeding completed");
    Ok(chunks.len())
}
