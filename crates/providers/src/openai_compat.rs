//! OpenAI-compatible backend implementation.
//!
//! Works with: OpenAI, Azure-style proxies, OpenRouter, Ollama, vLLM and any
//! endpoint exposing the OpenAI REST surface.
//!
//! Supports:
//! - Chat completions (`/chat/completions`)
//! - Legacy text completions (`/completions`)
//! - Embeddings (`/embeddings`)

use std::sync::Arc;

use async_trait::async_trait;
use promptwright_core::backend::{CredentialLookup, EmbeddingBackend, LlmBackend};
use promptwright_core::error::BackendError;
use promptwright_core::request::CompletionRequest;
use serde::Deserialize;
use tracing::{debug, warn};

/// Credential key the backend reads its API key from.
pub const OPENAI_API_KEY: &str = "openai_api_key";

/// An OpenAI-compatible LLM and embedding backend.
///
/// The API key is resolved through a [`CredentialLookup`] on every call, so
/// rotating the stored secret takes effect without rebuilding the backend.
pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    credentials: Arc<dyn CredentialLookup>,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    /// Create a new OpenAI-compatible backend.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialLookup>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a key is available for this backend.
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<String, BackendError> {
        self.credentials.get(OPENAI_API_KEY).ok_or_else(|| {
            BackendError::NotConfigured(format!("No API key available for '{}'", self.name))
        })
    }

    /// Endpoint path and JSON body for a completion request.
    fn completion_body(request: &CompletionRequest) -> (&'static str, serde_json::Value) {
        match request {
            CompletionRequest::Chat(chat) => (
                "chat/completions",
                serde_json::json!({
                    "model": chat.model,
                    "messages": chat.messages,
                    "stream": false,
                }),
            ),
            CompletionRequest::Text(text) => (
                "completions",
                serde_json::json!({
                    "model": text.model,
                    "prompt": text.prompt,
                    "stream": false,
                }),
            ),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/{}", self.base_url, path);
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(e.to_string())
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(BackendError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, backend = %self.name, "Backend returned error");
            return Err(BackendError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, BackendError> {
        let (path, body) = Self::completion_body(&request);

        debug!(backend = %self.name, model = %request.model(), path, "Sending completion request");

        let response = self.post(path, &body).await?;
        let api_response: ApiResponse =
            response.json().await.map_err(|e| BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(ApiChoice::into_text)
            .ok_or_else(|| BackendError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiCompatBackend {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, BackendError> {
        let body = serde_json::json!({
            "model": model,
            "input": [text],
            "encoding_format": "float",
        });

        debug!(backend = %self.name, model, "Sending embedding request");

        let response = self.post("embeddings", &body).await?;
        let api_resp: EmbeddingApiResponse =
            response.json().await.map_err(|e| BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        api_resp
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| BackendError::ApiError {
                status_code: 200,
                message: "No embedding in response".into(),
            })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

/// A choice from either endpoint: chat responses carry `message`, text
/// responses carry `text`.
#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    text: Option<String>,
}

impl ApiChoice {
    fn into_text(self) -> Option<String> {
        match (self.message, self.text) {
            (Some(message), _) => Some(message.content.unwrap_or_default()),
            (None, text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
