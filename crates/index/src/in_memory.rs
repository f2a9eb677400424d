//! In-memory semantic index.
//!
//! Holds embedded chunks behind a `tokio::sync::RwLock` and ranks them by
//! cosine similarity. An index that has never been populated answers every
//! query with `IndexError::Unavailable`, which is how "project not indexed"
//! reaches the retriever. A query whose dimension matches none of the stored
//! embeddings fails with `IndexError::DimensionMismatch` instead of
//! returning unrelated chunks.

use async_trait::async_trait;
use promptwright_core::backend::{ScoredChunk, SemanticIndex};
use promptwright_core::error::IndexError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::IndexedChunk;
use crate::vector::rank_chunks;

/// A thread-safe in-memory semantic index.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    /// `None` until the project has been indexed.
    chunks: Arc<RwLock<Option<Vec<IndexedChunk>>>>,
    min_score: f32,
}

impl InMemoryIndex {
    /// An index for a project that has not been indexed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index populated with `chunks`.
    pub fn from_chunks(chunks: Vec<IndexedChunk>) -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Some(chunks))),
            min_score: 0.0,
        }
    }

    /// Drop hits scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Swap in a freshly built set of chunks.
    pub async fn replace(&self, chunks: Vec<IndexedChunk>) {
        debug!(count = chunks.len(), "Replacing index contents");
        *self.chunks.write().await = Some(chunks);
    }

    pub async fn is_indexed(&self) -> bool {
        self.chunks.read().await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.as_ref().map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// A copy of the current chunks (empty if not indexed).
    pub async fn chunks(&self) -> Vec<IndexedChunk> {
        self.chunks.read().await.clone().unwrap_or_default()
    }
}

#[async_trait]
impl SemanticIndex for InMemoryIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let guard = self.chunks.read().await;
        let chunks = guard
            .as_ref()
            .ok_or_else(|| IndexError::Unavailable("project has not been indexed".into()))?;

        if !chunks.is_empty() && !chunks.iter().any(|c| c.embedding.len() == vector.len()) {
            return Err(IndexError::DimensionMismatch {
                query: vector.len(),
                indexed: chunks[0].embedding.len(),
            });
        }

        let hits = rank_chunks(chunks, vector, top_k, self.min_score);
        debug!(
            candidates = chunks.len(),
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Index query"
        );
        Ok(hits)
    }
}
