//! Semantic index for promptwright.
//!
//! Chunks a project directory, embeds the chunks, persists them as a single
//! JSON file, and answers nearest-neighbour queries by cosine similarity.

pub mod in_memory;
pub mod indexer;
pub mod store;
pub mod vector;

use serde::{Deserialize, Serialize};

pub use in_memory::InMemoryIndex;
pub use indexer::{Indexer, IndexingCompleted, chunk_lines};
pub use store::{IndexFile, IndexStore};
pub use vector::{cosine_similarity, rank_chunks};

/// A piece of project text together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub content: String,
    /// Path relative to the indexed root.
    #[serde(default)]
    pub source: String,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            source: source.into(),
            embedding,
        }
    }
}
