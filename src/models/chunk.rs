use serde::{Deserialize, Serialize};

/// A fragment of the movie corpus together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

impl ContentChunk {
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            content: content.into(),
            embedding,
        }
    }
}

/// A chunk returned by a nearest-neighbour query
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMatch {
    pub chunk: ContentChunk,
    /// Cosine similarity to the query vector
    pub similarity: f32,
}
