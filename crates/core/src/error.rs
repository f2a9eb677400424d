//! Error types for the promptwright domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; only [`CompileError`]
//! ever crosses the compiler boundary.

use std::fmt;
use thiserror::Error;

/// Errors surfaced by a compile call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The system prompt and the new message alone do not fit, even with
    /// zero history retained.
    #[error(
        "Total usage exceeded: system prompt ({system_tokens} tokens) + new message ({message_tokens} tokens) exceed budget ({budget} tokens)"
    )]
    TotalUsageExceeded {
        system_tokens: usize,
        message_tokens: usize,
        budget: usize,
    },
}

/// Result type alias for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

// --- Collaborator errors ---

/// Failures reported by LLM and embedding backends.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures reported by the semantic index.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The project has not been indexed yet.
    #[error("Semantic index unavailable: {0}")]
    Unavailable(String),

    #[error("Index storage error: {0}")]
    Storage(String),

    #[error("Index build failed: {0}")]
    Build(String),

    /// No indexed chunk has the query vector's dimension.
    #[error("Embedding dimension mismatch: query has {query}, index has {indexed}")]
    DimensionMismatch { query: usize, indexed: usize },

    /// The index was built with a different embedding model.
    #[error("Index was built with '{indexed}' but '{configured}' is configured")]
    ModelMismatch { indexed: String, configured: String },
}

/// The step of the contextual search pipeline that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Rewriting,
    Embedding,
    Searching,
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rewriting => "query rewrite",
            Self::Embedding => "embedding",
            Self::Searching => "index lookup",
        };
        f.write_str(name)
    }
}

/// Contextual search failed. Internal and non-fatal: the compiler answers it
/// by falling back to history-based compilation.
#[derive(Debug, Clone, Error)]
#[error("Context retrieval failed during {stage}: {reason}")]
pub struct RetrievalError {
    pub stage: RetrievalStage,
    pub reason: String,
}

impl RetrievalError {
    pub fn new(stage: RetrievalStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}
