//! Dispatch request/reply types and the respond endpoint's wire format

use crate::message::{CorrelationToken, Message, Part, Role};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One outbound call's worth of input
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Persona name, sent as the system instruction
    pub persona: String,
    /// Confirmed history; never includes the message this dispatch confirms
    pub history: Vec<Message>,
    pub prompt: String,
    pub token: CorrelationToken,
}

/// Normalized reply from the respond endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Durable id, when the endpoint assigns one
    pub id: Option<String>,
    pub content: Vec<Part>,
}

/// Shape of a successful response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    /// `{ "id"?, "role": "model", "part": [{ "text" }] }`
    #[default]
    Structured,
    /// Legacy: the whole body is the reply text
    PlainText,
}

impl FromStr for ReplyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(Self::Structured),
            "text" | "plain" | "plain_text" => Ok(Self::PlainText),
            other => Err(format!("unknown reply format: {other}")),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRequest<'a> {
    pub system_instruction: &'a str,
    pub history: Vec<WireMessage>,
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub part: Vec<Part>,
}

impl WireMessage {
    pub fn from_message(message: &Message) -> Self {
        let id = match message.id() {
            crate::message::MessageId::Remote(id) => Some(id.clone()),
            _ => None,
        };
        Self {
            id,
            role: message.role(),
            part: message.content().to_vec(),
        }
    }
}

impl<'a> WireRequest<'a> {
    pub fn from_request(request: &'a DispatchRequest) -> Self {
        Self {
            system_instruction: &request.persona,
            history: request.history.iter().map(WireMessage::from_message).collect(),
            prompt: &request.prompt,
        }
    }
}
