//! Conversation state types

use crate::message::CorrelationToken;
use serde::{Deserialize, Serialize};

/// Phase of the current dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input, no pending dispatch
    #[default]
    Idle,

    /// One dispatch in flight; `token` names the provisional user message
    Dispatching { token: CorrelationToken },
}

impl ConvState {
    pub fn is_dispatching(&self) -> bool {
        matches!(self, ConvState::Dispatching { .. })
    }

    /// Token of the in-flight dispatch, if any
    pub fn in_flight(&self) -> Option<CorrelationToken> {
        match self {
            ConvState::Idle => None,
            ConvState::Dispatching { token } => Some(*token),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Dispatching { .. } => "dispatching",
        }
    }
}
