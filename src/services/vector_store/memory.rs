//! In-memory [`VectorStore`] with brute-force cosine search.

use std::cmp::Ordering;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{ContentChunk, ContentMatch},
};

use super::{cosine_similarity, VectorStore};

#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<ContentChunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }
}

/// Checks a batch before anything is appended so a bad row rejects it whole
fn validate_batch(chunks: &[ContentChunk], stored_dims: Option<usize>) -> AppResult<()> {
    let dims = stored_dims.or_else(|| chunks.first().map(|c| c.embedding.len()));

    for (row, chunk) in chunks.iter().enumerate() {
        if chunk.content.trim().is_empty() {
            return Err(AppError::Ingest(format!("Row {} has empty content", row)));
        }
        if chunk.embedding.is_empty() {
            return Err(AppError::Ingest(format!("Row {} has an empty embedding", row)));
        }
        if Some(chunk.embedding.len()) != dims {
            return Err(AppError::Ingest(format!(
                "Row {} has {} dimensions, expected {}",
                row,
                chunk.embedding.len(),
                dims.unwrap_or(0)
            )));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ingest(&self, chunks: &[ContentChunk]) -> AppResult<()> {
        let mut stored = self.chunks.write().await;
        let stored_dims = stored.first().map(|c| c.embedding.len());
        validate_batch(chunks, stored_dims)?;
        stored.extend_from_slice(chunks);

        tracing::info!(inserted = chunks.len(), total = stored.len(), store = "memory", "Chunks ingested");
        Ok(())
    }

    async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.chunks.read().await.is_empty())
    }

    async fn nearest(
        &self,
        query: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> AppResult<Vec<ContentMatch>> {
        let stored = self.chunks.read().await;

        let mut matches: Vec<ContentMatch> = stored
            .iter()
            .map(|chunk| ContentMatch {
                similarity: cosine_similarity(query, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .filter(|m| m.similarity >= similarity_threshold)
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        matches.truncate(match_count);

        Ok(matches)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
