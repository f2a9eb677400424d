//! Builds an index from a project directory.
//!
//! Walks the tree, splits every text file into fixed line windows, embeds
//! each window, and returns the chunks ready for an [`IndexFile`].
//!
//! [`IndexFile`]: crate::store::IndexFile

use futures::StreamExt;
use promptwright_core::backend::EmbeddingBackend;
use promptwright_core::error::IndexError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::IndexedChunk;

/// Files larger than this are skipped.
const MAX_FILE_BYTES: u64 = 512 * 1024;

/// Embedding calls in flight at once.
const EMBED_CONCURRENCY: usize = 4;

const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "build", "dist", "out", "vendor"];

/// Summary of a finished indexing run.
#[derive(Debug, Clone)]
pub struct IndexingCompleted {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks: Vec<IndexedChunk>,
}

/// Turns a directory into embedded chunks.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingBackend>,
    embedding_model: String,
    chunk_lines: usize,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingBackend>,
        embedding_model: impl Into<String>,
        chunk_lines: usize,
    ) -> Self {
        Self {
            embedder,
            embedding_model: embedding_model.into(),
            chunk_lines: chunk_lines.max(1),
        }
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Index every text file under `root`.
    ///
    /// Any embedding failure aborts the run; a partial index would silently
    /// answer queries with stale or missing content.
    pub async fn index_dir(&self, root: &Path) -> Result<IndexingCompleted, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::Build(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut pending: Vec<(String, String)> = Vec::new();
        let mut files_indexed = 0;
        let mut files_skipped = 0;

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    files_skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(text) = read_text_file(&entry) else {
                files_skipped += 1;
                continue;
            };

            let source = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            let windows = chunk_lines(&text, self.chunk_lines);
            debug!(file = %source, chunks = windows.len(), "Chunked file");
            pending.extend(windows.into_iter().map(|w| (source.clone(), w)));
            files_indexed += 1;
        }

        let chunks = self.embed_all(pending).await?;

        info!(
            files = files_indexed,
            skipped = files_skipped,
            chunks = chunks.len(),
            "Indexing completed"
        );

        Ok(IndexingCompleted {
            files_indexed,
            files_skipped,
            chunks,
        })
    }

    async fn embed_all(
        &self,
        pending: Vec<(String, String)>,
    ) -> Result<Vec<IndexedChunk>, IndexError> {
        let model = self.embedding_model.as_str();
        let results: Vec<Result<IndexedChunk, IndexError>> = futures::stream::iter(pending)
            .map(|(source, content)| async move {
                let embedding = self.embedder.embed(&content, model).await.map_err(|e| {
                    IndexError::Build(format!("Embedding {source} failed: {e}"))
                })?;
                Ok(IndexedChunk::new(content, source, embedding))
            })
            .buffered(EMBED_CONCURRENCY)
            .collect()
            .await;

        results.into_iter().collect()
    }
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// File contents if it is a reasonably sized UTF-8 text file.
fn read_text_file(entry: &DirEntry) -> Option<String> {
    let size = entry.metadata().ok()?.len();
    if size == 0 || size > MAX_FILE_BYTES {
        return None;
    }
    let text = std::fs::read_to_string(entry.path()).ok()?;
    (!text.contains('\0')).then_some(text)
}

/// Split text into windows of `lines_per_chunk` lines, dropping blank windows.
pub fn chunk_lines(text: &str, lines_per_chunk: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .chunks(lines_per_chunk.max(1))
        .map(|window| window.join("\n"))
        .filter(|window| !window.trim().is_empty())
        .collect()
}
