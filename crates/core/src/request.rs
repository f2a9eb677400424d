//! Completion requests, the compiler's output.
//!
//! Both shapes serialize to the JSON body of the matching OpenAI-style
//! endpoint, so a transport can send them as-is.

use serde::{Deserialize, Serialize};

/// The role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, rules)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Legacy single-prompt request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCompletionRequest {
    pub model: String,
    pub prompt: String,
}

/// Structured role-based request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// A wire-ready completion request in one of the two supported shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionRequest {
    Chat(ChatCompletionRequest),
    Text(TextCompletionRequest),
}

impl CompletionRequest {
    /// A chat request consisting of a single user message.
    pub fn single_user_message(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Chat(ChatCompletionRequest {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
        })
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Chat(r) => &r.model,
            Self::Text(r) => &r.model,
        }
    }

    pub fn as_chat(&self) -> Option<&ChatCompletionRequest> {
        match self {
            Self::Chat(r) => Some(r),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextCompletionRequest> {
        match self {
            Self::Text(r) => Some(r),
            Self::Chat(_) => None,
        }
    }
}
