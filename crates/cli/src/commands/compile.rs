//! `promptwright compile`: build a completion request and print it.

use anyhow::{Context, bail};
use promptwright_compiler::{
    CompileOptions, CompilerSettings, ContextRetriever, RequestCompiler,
    retrieval_settings_from_config,
};
use promptwright_config::{AppConfig, ContextualSearchConfig};
use promptwright_core::backend::{EmbeddingBackend, LlmBackend, SemanticIndex};
use promptwright_core::message::{Conversation, Message};
use promptwright_index::{InMemoryIndex, IndexStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CompileArgs {
    pub conversation: PathBuf,
    pub message: Option<String>,
    pub model: Option<String>,
    pub retry: bool,
    pub contextual_search: bool,
}

pub async fn run(args: CompileArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let raw = std::fs::read_to_string(&args.conversation).with_context(|| {
        format!("Failed to read conversation {}", args.conversation.display())
    })?;
    let conversation: Conversation = serde_json::from_str(&raw).with_context(|| {
        format!("Invalid conversation file {}", args.conversation.display())
    })?;

    let message = select_message(&conversation, args.message, args.retry)?;
    let model = args
        .model
        .unwrap_or_else(|| conversation.model.clone());

    let backends = promptwright_providers::build_from_config(&config);
    let mut compiler =
        RequestCompiler::new(CompilerSettings::from_config(&config), backends.catalog.clone());

    if args.contextual_search {
        let llm: Arc<dyn LlmBackend> = backends.openai.clone();
        let embedder: Arc<dyn EmbeddingBackend> = backends.openai.clone();
        let index: Arc<dyn SemanticIndex> = Arc::new(open_index(&config.contextual_search));
        compiler = compiler.with_retriever(ContextRetriever::new(
            llm,
            embedder,
            index,
            retrieval_settings_from_config(&config),
        ));
    }

    let options = CompileOptions {
        is_retry: args.retry,
        use_contextual_search: args.contextual_search,
    };
    let request = compiler
        .compile(&conversation, &message, &model, options)
        .await?;

    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// The project index, or an unindexed one if the file cannot be used.
///
/// A broken index only disables contextual search; the compile itself goes
/// ahead from history.
fn open_index(search: &ContextualSearchConfig) -> InMemoryIndex {
    let index_path = search.index_path();
    let index = match IndexStore::new(&index_path).load(&search.embedding_model) {
        Ok(index) => {
            debug!(path = %index_path.display(), "Index loaded");
            index
        }
        Err(e) => {
            warn!(
                path = %index_path.display(),
                error = %e,
                "Index unusable, contextual search will fall back to history"
            );
            InMemoryIndex::new()
        }
    };
    index.with_min_score(search.min_score)
}

/// The message to compile: the given text, or the last message when retrying.
fn select_message(
    conversation: &Conversation,
    text: Option<String>,
    retry: bool,
) -> anyhow::Result<Message> {
    match (text, retry) {
        (_, true) => conversation
            .last_message()
            .cloned()
            .context("Cannot retry: the conversation has no messages"),
        (Some(text), false) => Ok(Message::new(text)),
        (None, false) => bail!("--message is required unless --retry is given"),
    }
}
