//! Scripted collaborators shared by the compiler tests.

use async_trait::async_trait;
use promptwright_core::backend::{
    EmbeddingBackend, LlmBackend, ModelCatalog, ScoredChunk, SemanticIndex,
};
use promptwright_core::error::{BackendError, IndexError};
use promptwright_core::request::CompletionRequest;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// An LLM backend that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue.
/// Panics if more calls are made than results provided.
pub struct SequentialMockLlm {
    responses: Mutex<Vec<Result<String, BackendError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl SequentialMockLlm {
    pub fn new(responses: Vec<Result<String, BackendError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for SequentialMockLlm {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, BackendError> {
        let mut requests = self.requests.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!(
                "SequentialMockLlm: no more responses (call #{})",
                requests.len() + 1
            );
        }
        requests.push(request);
        responses.remove(0)
    }
}

/// An LLM backend that never answers in time.
pub struct SlowLlm(pub Duration);

#[async_trait]
impl LlmBackend for SlowLlm {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, BackendError> {
        tokio::time::sleep(self.0).await;
        Ok("too late".into())
    }
}

/// Returns the same vector for every input, or always fails.
pub struct ScriptedEmbedder {
    vector: Option<Vec<f32>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(text, model)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingBackend for ScriptedEmbedder {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), model.to_string()));
        self.vector.clone().ok_or_else(|| BackendError::ApiError {
            status_code: 500,
            message: "embedding service down".into(),
        })
    }
}

/// An index that answers every query with the same ranked chunks.
pub struct FixedIndex {
    chunks: Vec<ScoredChunk>,
    queries: Mutex<Vec<(Vec<f32>, usize)>>,
}

impl FixedIndex {
    pub fn new(chunks: Vec<(&str, f32)>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .map(|(content, score)| ScoredChunk {
                    content: content.to_string(),
                    source: "README.md".into(),
                    score,
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// `(vector, top_k)` pairs received so far.
    pub fn queries(&self) -> Vec<(Vec<f32>, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticIndex for FixedIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        self.queries.lock().unwrap().push((vector.to_vec(), top_k));
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

/// An index for a project that was never indexed.
pub struct FailingIndex;

#[async_trait]
impl SemanticIndex for FailingIndex {
    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Err(IndexError::Unavailable("project has not been indexed".into()))
    }
}

/// A catalog backed by a map.
pub struct FixedCatalog(pub HashMap<String, usize>);

impl FixedCatalog {
    pub fn single(model: &str, max_tokens: usize) -> Self {
        Self(HashMap::from([(model.to_string(), max_tokens)]))
    }
}

impl ModelCatalog for FixedCatalog {
    fn max_tokens(&self, model: &str) -> Option<usize> {
        self.0.get(model).copied()
    }
}
