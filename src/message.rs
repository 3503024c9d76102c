//! Conversation message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token correlating a dispatch outcome with the submission that caused it.
///
/// It is also the local id of the user message the dispatch confirms.
pub type CorrelationToken = Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One text segment of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Self { text: s.into() }
    }
}

/// Message identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageId {
    /// Generated locally for user submissions. Provisional while the
    /// dispatch carrying the same token is in flight.
    Local(Uuid),
    /// Durable id assigned by the respond endpoint
    Remote(String),
    /// Assigned by the dispatcher when the reply carries no id
    Sequence(u64),
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageId::Local(id) => write!(f, "local-{id}"),
            MessageId::Remote(id) => write!(f, "{id}"),
            MessageId::Sequence(n) => write!(f, "seq-{n}"),
        }
    }
}

/// A single conversation turn. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: Vec<Part>,
    created_at: DateTime<Utc>,
}

impl Message {
    /// User message awaiting confirmation by the dispatch tagged `token`
    pub fn user(token: CorrelationToken, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::Local(token),
            role: Role::User,
            content: vec![Part::text(text)],
            created_at: Utc::now(),
        }
    }

    pub fn model(id: MessageId, content: Vec<Part>) -> Self {
        Self {
            id,
            role: Role::Model,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &[Part] {
        &self.content
    }

    /// All text parts concatenated
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Whether this message is the optimistic entry for `token`
    pub fn is_local(&self, token: CorrelationToken) -> bool {
        self.id == MessageId::Local(token)
    }
}
