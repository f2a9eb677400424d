//! Collaborator traits: the narrow seams between the compiler and the
//! outside world.
//!
//! The compiler never talks HTTP, reads credentials, or opens the index
//! itself. It is handed implementations of these traits. Implementations:
//! OpenAI-compatible HTTP backend, static model catalog, in-memory /
//! file-backed semantic index, and scripted mocks for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, IndexError};
use crate::request::CompletionRequest;

/// Source of API secrets, keyed by service name (e.g. `"openai_api_key"`).
///
/// Used by transports only; the compiler never sees credentials.
pub trait CredentialLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// An LLM that can answer a completion request with generated text.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the request and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, BackendError>;
}

/// Turns text into a fixed-length embedding vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, BackendError>;
}

/// A chunk of indexed project content together with its similarity to a
/// query vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The chunk text.
    pub content: String,
    /// Human-readable source label (relative file path, URL, etc.).
    #[serde(default)]
    pub source: String,
    /// Cosine similarity to the query vector (-1.0 to 1.0).
    pub score: f32,
}

/// The project's semantic index.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Return up to `top_k` chunks ordered by descending similarity.
    ///
    /// Fails with [`IndexError::Unavailable`] if the project has not been
    /// indexed.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError>;
}

/// Knows each model's context window.
pub trait ModelCatalog: Send + Sync {
    /// Maximum tokens the model accepts per request, if the model is known.
    fn max_tokens(&self, model: &str) -> Option<usize>;
}
