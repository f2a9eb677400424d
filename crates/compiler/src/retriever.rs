//! Contextual search: answer from the project's semantic index instead of
//! conversation history.
//!
//! # Flow
//!
//! 1. Rewrite the question into a comma-separated search query (LLM call)
//! 2. Embed the query
//! 3. Look up the best matching chunks in the semantic index
//! 4. Fold the chunks and the original question into a single prompt
//!
//! Each step runs under its own timeout. Any failure, including an empty
//! result at any step, ends the pipeline with a [`RetrievalError`] naming
//! the stage; the caller then falls back to history-based compilation.

use promptwright_core::backend::{EmbeddingBackend, LlmBackend, ScoredChunk, SemanticIndex};
use promptwright_core::error::{RetrievalError, RetrievalStage};
use promptwright_core::request::CompletionRequest;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Few-shot prompt that turns a question into a semantic search query.
pub const REWRITE_PROMPT_TEMPLATE: &str = "You are Text Generator, a helpful expert of generating natural language into semantically comparable search query.

Text: List all the dependencies that the project uses
AI: project dependencies, development dependencies, versions, libraries, frameworks, packages

Text: Are there any scheduled tasks or background jobs running in our codebase, and if so, what are they responsible for?
AI: scheduled tasks, background jobs, cron jobs, task schedules, codebase tasks

Text: {question}
AI:";

/// Prompt that carries the retrieved context and the original question.
pub const CONTEXT_PROMPT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context:

{context}

Question: {question}

Helpful answer in Markdown format:";

/// Fill [`REWRITE_PROMPT_TEMPLATE`].
pub fn build_rewrite_prompt(question: &str) -> String {
    REWRITE_PROMPT_TEMPLATE.replace("{question}", question)
}

/// Fill [`CONTEXT_PROMPT_TEMPLATE`].
pub fn build_context_prompt(context: &str, question: &str) -> String {
    // One pass, so placeholders inside the inputs stay literal.
    let (head, tail) = CONTEXT_PROMPT_TEMPLATE
        .split_once("{context}")
        .unwrap_or((CONTEXT_PROMPT_TEMPLATE, ""));
    format!("{head}{context}{}", tail.replacen("{question}", question, 1))
}

/// Models and limits used by the retrieval pipeline.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub rewrite_model: String,
    pub embedding_model: String,
    /// Chunks folded into the prompt, best first.
    pub top_k: usize,
    /// Applied to each step separately.
    pub step_timeout: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            rewrite_model: "gpt-4".into(),
            embedding_model: "text-embedding-ada-002".into(),
            top_k: 1,
            step_timeout: Duration::from_secs(30),
        }
    }
}

/// A successful retrieval.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// The rewritten search query.
    pub query: String,
    /// Chunks used, best first.
    pub chunks: Vec<ScoredChunk>,
    /// The assembled prompt that replaces the conversation.
    pub prompt: String,
}

/// Where the pipeline is. Every step either advances or fails; there is no
/// per-step recovery.
enum RetrievalState {
    Rewriting,
    Embedding { query: String },
    Searching { query: String, vector: Vec<f32> },
    Done { query: String, chunks: Vec<ScoredChunk> },
}

/// Runs the rewrite -> embed -> search pipeline.
pub struct ContextRetriever {
    llm: Arc<dyn LlmBackend>,
    embedder: Arc<dyn EmbeddingBackend>,
    index: Arc<dyn SemanticIndex>,
    settings: RetrievalSettings,
}

impl ContextRetriever {
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        embedder: Arc<dyn EmbeddingBackend>,
        index: Arc<dyn SemanticIndex>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            llm,
            embedder,
            index,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Build a context-augmented prompt for `question`.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedContext, RetrievalError> {
        let mut state = RetrievalState::Rewriting;
        loop {
            state = match state {
                RetrievalState::Rewriting => RetrievalState::Embedding {
                    query: self.rewrite(question).await?,
                },
                RetrievalState::Embedding { query } => {
                    let vector = self.embed(&query).await?;
                    RetrievalState::Searching { query, vector }
                }
                RetrievalState::Searching { query, vector } => RetrievalState::Done {
                    chunks: self.search(&vector).await?,
                    query,
                },
                RetrievalState::Done { query, chunks } => {
                    let context = chunks
                        .iter()
                        .map(|c| c.content.as_str())
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    info!(
                        query = %query,
                        chunks = chunks.len(),
                        top_score = chunks.first().map(|c| c.score),
                        "Contextual search succeeded"
                    );
                    return Ok(RetrievedContext {
                        prompt: build_context_prompt(&context, question),
                        query,
                        chunks,
                    });
                }
            };
        }
    }

    async fn rewrite(&self, question: &str) -> Result<String, RetrievalError> {
        let request = CompletionRequest::single_user_message(
            &self.settings.rewrite_model,
            build_rewrite_prompt(question),
        );
        let query = self
            .step(RetrievalStage::Rewriting, self.llm.complete(request))
            .await?;
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(RetrievalError::new(
                RetrievalStage::Rewriting,
                "backend returned an empty search query",
            ));
        }
        debug!(query = %query, "Search query rewritten");
        Ok(query)
    }

    async fn embed(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let vector = self
            .step(
                RetrievalStage::Embedding,
                self.embedder.embed(query, &self.settings.embedding_model),
            )
            .await?;
        if vector.is_empty() {
            return Err(RetrievalError::new(
                RetrievalStage::Embedding,
                "backend returned an empty embedding",
            ));
        }
        Ok(vector)
    }

    async fn search(&self, vector: &[f32]) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let chunks = self
            .step(
                RetrievalStage::Searching,
                self.index.query(vector, self.settings.top_k),
            )
            .await?;
        if chunks.is_empty() {
            return Err(RetrievalError::new(
                RetrievalStage::Searching,
                "no indexed content matched the query",
            ));
        }
        Ok(chunks)
    }

    /// Await one step under the step timeout, tagging any failure with `stage`.
    async fn step<T, E>(
        &self,
        stage: RetrievalStage,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, RetrievalError>
    where
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.settings.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RetrievalError::new(stage, e.to_string())),
            Err(_) => Err(RetrievalError::new(
                stage,
                format!("timed out after {:?}", self.settings.step_timeout),
            )),
        }
    }
}
