//! The request compiler: conversation + new message -> completion request.
//!
//! ```text
//! compile()
//!   ├─ contextual search requested and a retriever attached?
//!   │    ├─ success -> single-turn request carrying the context prompt
//!   │    └─ failure -> warn, continue below
//!   └─ build()
//!        ├─ resolve system prompt
//!        ├─ reduce history against the model's budget
//!        └─ render Text or Chat by the conversation's client code
//! ```
//!
//! `build` is pure and synchronous. `compile` only adds the retrieval
//! attempt, whose failures never escape: the only error a caller can see is
//! [`TotalUsageExceeded`].
//!
//! [`TotalUsageExceeded`]: promptwright_core::error::CompileError::TotalUsageExceeded

use promptwright_config::AppConfig;
use promptwright_core::backend::ModelCatalog;
use promptwright_core::error::Result;
use promptwright_core::message::{ClientCode, Conversation, Message};
use promptwright_core::request::{
    ChatCompletionRequest, ChatMessage, CompletionRequest, TextCompletionRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::reducer::{HistoryReducer, Reduction, ReductionInput};
use crate::retriever::{ContextRetriever, RetrievalSettings};
use crate::token::{CharHeuristicEstimator, TokenEstimator};

/// Persona used when no system prompt override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are ChatGPT, a large language model trained by OpenAI.\nAnswer in a markdown language, code blocks should contain language whenever possible.";

/// Explicit settings the compiler is constructed with.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Override for the system prompt. Blank means [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: String,
    pub per_message_overhead: usize,
    pub safety_margin: usize,
    /// Window assumed for models the catalog does not know.
    pub fallback_max_tokens: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            per_message_overhead: 7,
            safety_margin: 0,
            fallback_max_tokens: 4097,
        }
    }
}

impl CompilerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            per_message_overhead: config.completion.per_message_overhead,
            safety_margin: config.completion.safety_margin,
            fallback_max_tokens: config.completion.fallback_max_tokens,
        }
    }

    /// The system prompt to send.
    pub fn resolved_system_prompt(&self) -> &str {
        if self.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            &self.system_prompt
        }
    }
}

/// Retrieval settings taken from the `[contextual_search]` section.
pub fn retrieval_settings_from_config(config: &AppConfig) -> RetrievalSettings {
    let search = &config.contextual_search;
    RetrievalSettings {
        rewrite_model: search.rewrite_model.clone(),
        embedding_model: search.embedding_model.clone(),
        top_k: search.top_k,
        step_timeout: Duration::from_secs(search.timeout_secs),
    }
}

/// Per-call flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Regenerate the response of the message being compiled.
    pub is_retry: bool,
    /// Try to answer from the project index instead of history.
    pub use_contextual_search: bool,
}

impl CompileOptions {
    pub fn retry() -> Self {
        Self {
            is_retry: true,
            ..Self::default()
        }
    }

    pub fn contextual_search() -> Self {
        Self {
            use_contextual_search: true,
            ..Self::default()
        }
    }
}

/// Turns a conversation and a new message into a completion request.
pub struct RequestCompiler {
    settings: CompilerSettings,
    catalog: Arc<dyn ModelCatalog>,
    reducer: HistoryReducer,
    retriever: Option<ContextRetriever>,
}

impl RequestCompiler {
    pub fn new(settings: CompilerSettings, catalog: Arc<dyn ModelCatalog>) -> Self {
        let reducer = HistoryReducer::new(
            Arc::new(CharHeuristicEstimator),
            settings.per_message_overhead,
        );
        Self {
            settings,
            catalog,
            reducer,
            retriever: None,
        }
    }

    /// Replace the token estimator.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.reducer = HistoryReducer::new(estimator, self.settings.per_message_overhead);
        self
    }

    /// Enable contextual search.
    pub fn with_retriever(mut self, retriever: ContextRetriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Token budget for `model`: its window minus the safety margin.
    pub fn budget(&self, model: &str) -> usize {
        let max_tokens = self.catalog.max_tokens(model).unwrap_or_else(|| {
            warn!(
                model,
                fallback = self.settings.fallback_max_tokens,
                "Unknown model, using fallback context window"
            );
            self.settings.fallback_max_tokens
        });
        max_tokens.saturating_sub(self.settings.safety_margin)
    }

    /// Compile a request, trying contextual search first when asked.
    pub async fn compile(
        &self,
        conversation: &Conversation,
        message: &Message,
        model: &str,
        options: CompileOptions,
    ) -> Result<CompletionRequest> {
        if options.use_contextual_search {
            match &self.retriever {
                Some(retriever) => match retriever.retrieve(&message.prompt).await {
                    Ok(context) => {
                        return Ok(single_turn(conversation.client_code, model, context.prompt));
                    }
                    Err(e) => {
                        warn!(error = %e, "Contextual search failed, falling back to history");
                    }
                },
                None => debug!("Contextual search requested but no retriever attached"),
            }
        }

        self.build(conversation, message, model, options.is_retry)
    }

    /// Compile from history alone. No I/O.
    pub fn build(
        &self,
        conversation: &Conversation,
        message: &Message,
        model: &str,
        is_retry: bool,
    ) -> Result<CompletionRequest> {
        let reduction = self.reduce(conversation, message, model, is_retry)?;
        let system_prompt = self.settings.resolved_system_prompt();

        let request = match conversation.client_code {
            ClientCode::ChatCompletion => CompletionRequest::Chat(ChatCompletionRequest {
                model: model.to_string(),
                messages: render_chat(system_prompt, &reduction.retained, &message.prompt),
            }),
            ClientCode::TextCompletion => CompletionRequest::Text(TextCompletionRequest {
                model: model.to_string(),
                prompt: render_text(system_prompt, &reduction.retained, &message.prompt),
            }),
        };

        info!(
            conversation = %conversation.id,
            model,
            retained = reduction.retained.len(),
            dropped = reduction.dropped,
            tokens = reduction.total_tokens(),
            budget = reduction.budget,
            "Request compiled"
        );
        Ok(request)
    }

    /// Run history reduction for a message without rendering.
    pub fn reduce(
        &self,
        conversation: &Conversation,
        message: &Message,
        model: &str,
        is_retry: bool,
    ) -> Result<Reduction> {
        let history = conversation.snapshot();
        self.reducer.reduce(&ReductionInput {
            history: &history,
            system_prompt: self.settings.resolved_system_prompt(),
            new_prompt: &message.prompt,
            budget: self.budget(model),
            retry_of: is_retry.then_some(&message.id),
        })
    }
}

/// A self-contained request carrying only `prompt`.
fn single_turn(client_code: ClientCode, model: &str, prompt: String) -> CompletionRequest {
    match client_code {
        ClientCode::ChatCompletion => CompletionRequest::single_user_message(model, prompt),
        ClientCode::TextCompletion => CompletionRequest::Text(TextCompletionRequest {
            model: model.to_string(),
            prompt,
        }),
    }
}

fn render_chat(system_prompt: &str, history: &[Message], new_prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(system_prompt));
    for message in history {
        messages.push(ChatMessage::user(&message.prompt));
        if let Some(response) = &message.response {
            messages.push(ChatMessage::assistant(response));
        }
    }
    messages.push(ChatMessage::user(new_prompt));
    messages
}

fn render_text(system_prompt: &str, history: &[Message], new_prompt: &str) -> String {
    let mut prompt = format!("{system_prompt}\n");
    for message in history {
        prompt.push_str(&format!(
            "Human: {}\nAI: {}\n",
            message.prompt,
            message.response.as_deref().unwrap_or_default()
        ));
    }
    prompt.push_str(&format!("Human: {new_prompt}\nAI: \n"));
    prompt
}
