//! # promptwright compiler
//!
//! Turns a conversation and a new user message into a wire-ready
//! completion request that fits the target model's token budget.
//!
//! - [`token`]: token estimation
//! - [`reducer`]: most-recent-first history reduction
//! - [`retriever`]: contextual search (rewrite, embed, search, prompt)
//! - [`compiler`]: the entry point tying them together

pub mod compiler;
pub mod reducer;
pub mod retriever;
pub mod token;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use compiler::{
    CompileOptions, CompilerSettings, DEFAULT_SYSTEM_PROMPT, RequestCompiler,
    retrieval_settings_from_config,
};
pub use reducer::{HistoryReducer, Reduction, ReductionInput};
pub use retriever::{
    CONTEXT_PROMPT_TEMPLATE, ContextRetriever, REWRITE_PROMPT_TEMPLATE, RetrievalSettings,
    RetrievedContext, build_context_prompt, build_rewrite_prompt,
};
pub use token::{CharHeuristicEstimator, TokenEstimator, estimate_tokens};
