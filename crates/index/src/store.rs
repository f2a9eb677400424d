//! File-backed index persistence.
//!
//! The whole index is one JSON document: a small header plus the embedded
//! chunks. Storage location: `~/.promptwright/index/index.json` unless
//! configured otherwise.

use chrono::{DateTime, Utc};
use promptwright_core::error::IndexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::IndexedChunk;
use crate::in_memory::InMemoryIndex;

const FORMAT_VERSION: u32 = 1;

/// On-disk representation of an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub version: u32,
    /// Embedding model the vectors were produced with.
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
    pub chunks: Vec<IndexedChunk>,
}

impl IndexFile {
    pub fn new(embedding_model: impl Into<String>, chunks: Vec<IndexedChunk>) -> Self {
        Self {
            version: FORMAT_VERSION,
            embedding_model: embedding_model.into(),
            created_at: Utc::now(),
            chunks,
        }
    }
}

/// Reads and writes [`IndexFile`]s.
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the index file. `Ok(None)` if it does not exist yet.
    pub fn read(&self) -> Result<Option<IndexFile>, IndexError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IndexError::Storage(format!(
                    "Failed to read index at {}: {e}",
                    self.path.display()
                )));
            }
        };

        let file: IndexFile = serde_json::from_str(&content).map_err(|e| {
            IndexError::Storage(format!("Corrupted index at {}: {e}", self.path.display()))
        })?;

        if file.version != FORMAT_VERSION {
            return Err(IndexError::Storage(format!(
                "Unsupported index version {} (expected {FORMAT_VERSION})",
                file.version
            )));
        }

        debug!(path = %self.path.display(), chunks = file.chunks.len(), "Index file loaded");
        Ok(Some(file))
    }

    /// Load the index for querying with vectors from `embedding_model`.
    ///
    /// A missing file yields an unindexed [`InMemoryIndex`] so queries fail
    /// with `IndexError::Unavailable` rather than at load time. An index
    /// built with another embedding model is rejected.
    pub fn load(&self, embedding_model: &str) -> Result<InMemoryIndex, IndexError> {
        let Some(file) = self.read()? else {
            info!(path = %self.path.display(), "No index found, project not indexed");
            return Ok(InMemoryIndex::new());
        };

        if file.embedding_model != embedding_model {
            return Err(IndexError::ModelMismatch {
                indexed: file.embedding_model,
                configured: embedding_model.to_string(),
            });
        }
        Ok(InMemoryIndex::from_chunks(file.chunks))
    }

    /// Write the index file, creating parent directories as needed.
    pub fn save(&self, file: &IndexFile) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                IndexError::Storage(format!("Failed to create index directory: {e}"))
            })?;
        }

        let content = serde_json::to_string(file)
            .map_err(|e| IndexError::Storage(format!("Failed to serialize index: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| IndexError::Storage(format!("Failed to write index file: {e}")))?;

        info!(path = %self.path.display(), chunks = file.chunks.len(), "Index saved");
        Ok(())
    }
}
