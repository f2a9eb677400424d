//! End-to-end integration tests for promptwright.
//!
//! These tests wire the real compiler, catalog, index store and indexer
//! together, replacing only the network backends with scripted mocks.

use std::sync::{Arc, Mutex};

use promptwright_compiler::{
    CompileOptions, CompilerSettings, ContextRetriever, DEFAULT_SYSTEM_PROMPT, RequestCompiler,
    build_context_prompt, retrieval_settings_from_config,
};
use promptwright_config::AppConfig;
use promptwright_core::backend::{EmbeddingBackend, LlmBackend, SemanticIndex};
use promptwright_core::error::{BackendError, CompileError};
use promptwright_core::message::{ClientCode, Conversation, Message};
use promptwright_core::request::CompletionRequest;
use promptwright_index::{InMemoryIndex, IndexFile, IndexStore, IndexedChunk, Indexer};
use promptwright_providers::StaticModelCatalog;

// ── Mock Backends ───────────────────────────────────────────────────────

/// An LLM that answers every rewrite with the same query.
struct ScriptedLlm {
    answer: Result<String, BackendError>,
    calls: Mutex<usize>,
}

impl ScriptedLlm {
    fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            calls: Mutex::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            answer: Err(BackendError::RateLimited {
                retry_after_secs: 30,
            }),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl LlmBackend for ScriptedLlm {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, BackendError> {
        *self.calls.lock().unwrap() += 1;
        self.answer.clone()
    }
}

/// Embeds text as keyword presence flags, so similarity is predictable.
struct KeywordEmbedder;

const KEYWORDS: [&str; 3] = ["dependencies", "schedule", "database"];

#[async_trait::async_trait]
impl EmbeddingBackend for KeywordEmbedder {
    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>, BackendError> {
        let lower = text.to_lowercase();
        Ok(KEYWORDS
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn tokens(n: usize) -> String {
    "a".repeat(n * 4)
}

fn conversation(client_code: ClientCode, sizes: &[usize]) -> Conversation {
    let mut conv = Conversation::new(client_code, "gpt-3.5-turbo");
    for (i, n) in sizes.iter().enumerate() {
        conv.add_message(Message::with_response(format!("PROMPT_{i}"), tokens(*n)));
    }
    conv
}

fn compiler(config: &AppConfig) -> RequestCompiler {
    RequestCompiler::new(
        CompilerSettings::from_config(config),
        Arc::new(StaticModelCatalog::with_overrides(&config.models)),
    )
}

fn retriever(config: &AppConfig, llm: Arc<ScriptedLlm>, index: InMemoryIndex) -> ContextRetriever {
    let index: Arc<dyn SemanticIndex> = Arc::new(index);
    ContextRetriever::new(
        llm,
        Arc::new(KeywordEmbedder),
        index,
        retrieval_settings_from_config(config),
    )
}

fn project_index() -> InMemoryIndex {
    InMemoryIndex::from_chunks(vec![
        IndexedChunk::new("[dependencies]\ntokio = \"1\"", "Cargo.toml", vec![1.0, 0.0, 0.0]),
        IndexedChunk::new("fn nightly_schedule() {}", "src/jobs.rs", vec![0.0, 1.0, 0.0]),
    ])
}

// ── E2E: History Compilation ────────────────────────────────────────────

#[test]
fn e2e_chat_request_serializes_to_wire_body() {
    let mut config = AppConfig::default();
    config.system_prompt = "X".into();
    let mut conv = Conversation::new(ClientCode::ChatCompletion, "gpt-4");
    conv.add_message(Message::with_response("hi", "hello"));

    let request = compiler(&config)
        .build(&conv, &Message::new("how are you?"), "gpt-4", false)
        .unwrap();

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        serde_json::json!({
            "model": "gpt-4",
            "messages": [
                {"role": "system", "content": "X"},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
                {"role": "user", "content": "how are you?"}
            ]
        })
    );
}

#[test]
fn e2e_text_request_serializes_to_wire_body() {
    let conv = conversation(ClientCode::TextCompletion, &[]);
    let request = compiler(&AppConfig::default())
        .build(&conv, &Message::new("Q"), "text-davinci-003", false)
        .unwrap();

    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        serde_json::json!({
            "model": "text-davinci-003",
            "prompt": format!("{DEFAULT_SYSTEM_PROMPT}\nHuman: Q\nAI: \n")
        })
    );
}

#[test]
fn e2e_model_window_drives_reduction() {
    // gpt-3.5-turbo (4097) cannot hold both 1500-token messages plus the
    // default persona; gpt-3.5-turbo-16k can.
    let conv = conversation(ClientCode::ChatCompletion, &[1500, 1500, 1500]);
    let c = compiler(&AppConfig::default());
    let message = Message::new("next");

    let small = c.reduce(&conv, &message, "gpt-3.5-turbo", false).unwrap();
    let large = c.reduce(&conv, &message, "gpt-3.5-turbo-16k", false).unwrap();

    assert_eq!(small.retained.len(), 2);
    assert_eq!(large.retained.len(), 3);
    assert!(small.total_tokens() <= 4097);
}

#[test]
fn e2e_config_models_and_margin_shape_budget() {
    let mut config = AppConfig::default();
    config.models.insert("tiny-model".into(), 120);
    config.completion.safety_margin = 20;
    let conv = conversation(ClientCode::ChatCompletion, &[1500, 1500, 1500]);

    let err = compiler(&config)
        .build(&conv, &Message::new(tokens(100)), "tiny-model", false)
        .unwrap_err();

    assert!(matches!(err, CompileError::TotalUsageExceeded { budget: 100, .. }));
}

#[test]
fn e2e_config_file_round_trip_into_compiler() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
system_prompt = "You are terse."

[completion]
per_message_overhead = 3

[models]
"my-local-model" = 2048
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    let c = compiler(&config);
    assert_eq!(c.budget("my-local-model"), 2048);
    assert_eq!(c.settings().resolved_system_prompt(), "You are terse.");
    assert_eq!(c.settings().per_message_overhead, 3);
}

// ── E2E: Contextual Search ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_contextual_search_replaces_history() {
    let config = AppConfig::default();
    let llm = Arc::new(ScriptedLlm::answering("project dependencies, libraries"));
    let c = compiler(&config).with_retriever(retriever(&config, llm.clone(), project_index()));
    let conv = conversation(ClientCode::ChatCompletion, &[10, 20]);

    let question = "List all the dependencies that the project uses";
    let request = c
        .compile(&conv, &Message::new(question), "gpt-4", CompileOptions::contextual_search())
        .await
        .unwrap();

    let chat = request.as_chat().unwrap();
    assert_eq!(chat.messages.len(), 1);
    assert_eq!(
        chat.messages[0].content,
        build_context_prompt("[dependencies]\ntokio = \"1\"", question)
    );
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn e2e_unindexed_project_falls_back_to_history() {
    let config = AppConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let index = IndexStore::new(dir.path().join("index.json"))
        .load(&config.contextual_search.embedding_model)
        .unwrap();

    let llm = Arc::new(ScriptedLlm::answering("project dependencies"));
    let with_search = compiler(&config).with_retriever(retriever(&config, llm, index));
    let conv = conversation(ClientCode::ChatCompletion, &[10, 20]);
    let message = Message::new("What are our dependencies?");

    let fallback = with_search
        .compile(&conv, &message, "gpt-4", CompileOptions::contextual_search())
        .await
        .unwrap();
    let plain = compiler(&config).build(&conv, &message, "gpt-4", false).unwrap();

    assert_eq!(
        serde_json::to_vec(&fallback).unwrap(),
        serde_json::to_vec(&plain).unwrap()
    );
}

#[tokio::test]
async fn e2e_rate_limited_rewrite_falls_back() {
    let config = AppConfig::default();
    let c = compiler(&config).with_retriever(retriever(
        &config,
        Arc::new(ScriptedLlm::failing()),
        project_index(),
    ));
    let conv = conversation(ClientCode::ChatCompletion, &[10]);

    let request = c
        .compile(&conv, &Message::new("hi"), "gpt-4", CompileOptions::contextual_search())
        .await
        .unwrap();

    assert_eq!(request.as_chat().unwrap().messages.len(), 4);
}

#[tokio::test]
async fn e2e_min_score_rejects_weak_match() {
    let config = AppConfig::default();
    // The rewritten query mentions no known keyword: zero vector, zero score.
    let llm = Arc::new(ScriptedLlm::answering("weather forecast"));
    let index = project_index().with_min_score(0.5);
    let c = compiler(&config).with_retriever(retriever(&config, llm, index));
    let conv = conversation(ClientCode::ChatCompletion, &[]);

    let request = c
        .compile(&conv, &Message::new("weather?"), "gpt-4", CompileOptions::contextual_search())
        .await
        .unwrap();

    let chat = request.as_chat().unwrap();
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[1].content, "weather?");
}

#[tokio::test]
async fn e2e_index_from_other_embedding_model_falls_back() {
    let config = AppConfig::default();
    // Two-dimensional vectors cannot be compared with the three keyword flags.
    let stale = InMemoryIndex::from_chunks(vec![IndexedChunk::new(
        "UNRELATED",
        "old.rs",
        vec![0.6, 0.8],
    )]);
    let llm = Arc::new(ScriptedLlm::answering("project dependencies"));
    let with_search = compiler(&config).with_retriever(retriever(&config, llm, stale));
    let conv = conversation(ClientCode::ChatCompletion, &[10]);
    let message = Message::new("What are our dependencies?");

    let fallback = with_search
        .compile(&conv, &message, "gpt-4", CompileOptions::contextual_search())
        .await
        .unwrap();
    let plain = compiler(&config).build(&conv, &message, "gpt-4", false).unwrap();

    assert_eq!(fallback, plain);
}

// ── E2E: Index Build and Reload ─────────────────────────────────────────

#[tokio::test]
async fn e2e_index_directory_then_search() {
    let project = tempfile::tempdir().unwrap();
    std::fs::write(
        project.path().join("Cargo.toml"),
        "[package]\nname = \"demo\"\n\n[dependencies]\nserde = \"1\"",
    )
    .unwrap();
    std::fs::write(project.path().join("jobs.rs"), "// schedule the nightly cleanup").unwrap();

    let indexer = Indexer::new(Arc::new(KeywordEmbedder), "keyword-embed", 40);
    let report = indexer.index_dir(project.path()).await.unwrap();
    assert_eq!(report.files_indexed, 2);

    let store_dir = tempfile::tempdir().unwrap();
    let store = IndexStore::new(store_dir.path().join("index.json"));
    store
        .save(&IndexFile::new(indexer.embedding_model(), report.chunks))
        .unwrap();

    let config = AppConfig::default();
    let llm = Arc::new(ScriptedLlm::answering("scheduled tasks, schedule, cron jobs"));
    let c = compiler(&config).with_retriever(retriever(
        &config,
        llm,
        store.load(indexer.embedding_model()).unwrap(),
    ));

    let question = "Are there any scheduled tasks?";
    let request = c
        .compile(
            &conversation(ClientCode::TextCompletion, &[]),
            &Message::new(question),
            "text-davinci-003",
            CompileOptions::contextual_search(),
        )
        .await
        .unwrap();

    assert_eq!(
        request.as_text().unwrap().prompt,
        build_context_prompt("// schedule the nightly cleanup", question)
    );
}
