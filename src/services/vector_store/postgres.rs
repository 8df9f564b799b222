//! Postgres + pgvector [`VectorStore`]
//!
//! Chunks live in the `movies` table; similarity search goes through the
//! `match_movies` SQL function created by the migrations. Embeddings cross
//! the wire as `pgvector::Vector`.

use pgvector::Vector;
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{ContentChunk, ContentMatch},
};

use super::VectorStore;

#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row returned by `match_movies`
#[derive(Debug, Clone, sqlx::FromRow)]
struct MatchRow {
    content: String,
    embedding: Vector,
    similarity: f64,
}

impl From<MatchRow> for ContentMatch {
    fn from(row: MatchRow) -> Self {
        ContentMatch {
            chunk: ContentChunk::new(row.content, row.embedding.to_vec()),
            similarity: row.similarity as f32,
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for PgVectorStore {
    async fn ingest(&self, chunks: &[ContentChunk]) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Ingest(e.to_string()))?;

        for (row, chunk) in chunks.iter().enumerate() {
            sqlx::query("INSERT INTO movies (content, embedding) VALUES ($1, $2)")
                .bind(&chunk.content)
                .bind(Vector::from(chunk.embedding.clone()))
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Ingest(format!("Row {} rejected: {}", row, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Ingest(e.to_string()))?;

        tracing::info!(inserted = chunks.len(), store = "postgres", "Chunks ingested");
        Ok(())
    }

    async fn is_empty(&self) -> AppResult<bool> {
        let has_rows: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Retrieval(e.to_string()))?;

        Ok(!has_rows)
    }

    async fn nearest(
        &self,
        query: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> AppResult<Vec<ContentMatch>> {
        let match_count = i32::try_from(match_count)
            .map_err(|_| AppError::Retrieval(format!("match_count {} is too large", match_count)))?;

        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT content, embedding, similarity
            FROM match_movies($1, $2, $3)
            "#,
        )
        .bind(Vector::from(query.to_vec()))
        .bind(f64::from(similarity_threshold))
        .bind(match_count)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Retrieval(e.to_string()))?;

        let matches: Vec<ContentMatch> = rows.into_iter().map(ContentMatch::from).collect();

        tracing::debug!(matches = matches.len(), store = "postgres", "Similarity search completed");

        Ok(matches)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
