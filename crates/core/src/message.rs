//! Message and Conversation domain types.
//!
//! A conversation is a chronological list of prompt/response pairs. The
//! order in which messages were added is the order in which they are
//! replayed when a request is rebuilt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which completion API a conversation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCode {
    /// Legacy single-prompt completions (`/v1/completions`).
    TextCompletion,
    /// Role-based chat completions (`/v1/chat/completions`).
    ChatCompletion,
}

/// One user prompt and the assistant response to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// What the user asked.
    pub prompt: String,

    /// The assistant's answer. `None` while the completion is still pending.
    #[serde(default)]
    pub response: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a pending message (no response yet).
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            prompt: prompt.into(),
            response: None,
            created_at: Utc::now(),
        }
    }

    /// Create a message that already has its response.
    pub fn with_response(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        let mut message = Self::new(prompt);
        message.response = Some(response.into());
        message
    }

    /// Fill in (or replace) the response once the completion arrives.
    pub fn set_response(&mut self, response: impl Into<String>) {
        self.response = Some(response.into());
    }

    pub fn is_pending(&self) -> bool {
        self.response.is_none()
    }
}

/// An ordered, append-only history of messages with a target model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,

    pub client_code: ClientCode,

    /// Model the conversation was started with.
    pub model: String,

    /// Messages in chronological order.
    #[serde(default)]
    pub messages: Vec<Message>,

    pub created_on: DateTime<Utc>,

    pub updated_on: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new(client_code: ClientCode, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            client_code,
            model: model.into(),
            messages: Vec::new(),
            created_on: now,
            updated_on: now,
        }
    }

    /// Append a message to the end of the history.
    pub fn add_message(&mut self, message: Message) {
        self.updated_on = Utc::now();
        self.messages.push(message);
    }

    /// Set the response of the message with the given id.
    ///
    /// Returns `false` if no such message exists.
    pub fn update_response(&mut self, id: &MessageId, response: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| &m.id == id) {
            Some(message) => {
                message.set_response(response);
                self.updated_on = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// A stable copy of the history, safe to reduce while the live
    /// conversation keeps growing elsewhere.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn is_chat(&self) -> bool {
        self.client_code == ClientCode::ChatCompletion
    }
}
