//! API request and response types

use crate::persona::Persona;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// False when the message was ignored (blank, or a reply is pending)
    pub accepted: bool,
}

/// Request to switch persona
#[derive(Debug, Deserialize)]
pub struct SelectPersonaRequest {
    pub name: String,
}

/// Response with the roster and the active persona
#[derive(Debug, Serialize)]
pub struct PersonasResponse {
    pub personas: Vec<Persona>,
    pub selected: Persona,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub ok: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
