//! Vector storage for corpus chunks
//!
//! The [`VectorStore`] trait is what the pipeline and the seeding job talk
//! to. [`PgVectorStore`] keeps chunks in Postgres via pgvector;
//! [`InMemoryVectorStore`] does a brute-force scan and is used in tests and
//! for local runs without a database.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryVectorStore;
pub use postgres::PgVectorStore;

use crate::{
    error::AppResult,
    models::{ContentChunk, ContentMatch},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Appends chunks; a single rejected row fails the whole call
    async fn ingest(&self, chunks: &[ContentChunk]) -> AppResult<()>;

    async fn is_empty(&self) -> AppResult<bool>;

    /// Returns at most `match_count` chunks with cosine similarity of at
    /// least `similarity_threshold`, most similar first
    ///
    /// No match is an empty vector, not an error.
    async fn nearest(
        &self,
        query: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> AppResult<Vec<ContentMatch>>;

    fn name(&self) -> &'static str;
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
