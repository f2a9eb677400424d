//! # promptwright core
//!
//! Domain types, collaborator traits, and error definitions for the
//! promptwright request compiler. This crate has **zero framework
//! dependencies**: it defines the model that every other crate builds on.
//!
//! ## Design Philosophy
//!
//! Every external service (LLM, embeddings, semantic index, model catalog,
//! credentials) is a trait here. Implementations live in their respective
//! crates, so the compiler can be tested against scripted mocks.

pub mod backend;
pub mod error;
pub mod message;
pub mod request;

// Re-export key types at crate root for ergonomics
pub use backend::{
    CredentialLookup, EmbeddingBackend, LlmBackend, ModelCatalog, ScoredChunk, SemanticIndex,
};
pub use error::{
    BackendError, CompileError, IndexError, Result, RetrievalError, RetrievalStage,
};
pub use message::{ClientCode, Conversation, ConversationId, Message, MessageId};
pub use request::{
    ChatCompletionRequest, ChatMessage, CompletionRequest, Role, TextCompletionRequest,
};
