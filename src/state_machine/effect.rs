//! Effects produced by state transitions

use crate::message::{CorrelationToken, Message, MessageId};

/// Effects to be applied to the conversation log after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop every message
    ClearLog,

    /// Append to the end of the log
    AppendMessage(Message),

    /// Roll back an optimistic insert
    RemoveMessage { id: MessageId },

    /// The optimistic insert with this id is no longer provisional.
    /// Nothing changes in the log; observers drop the pending mark.
    ConfirmMessage { id: MessageId },

    /// Make a user-facing error available for display
    RecordError { message: String },

    ClearError,

    /// Issue the outbound call for `prompt`
    RequestDispatch {
        prompt: String,
        token: CorrelationToken,
    },
}

impl Effect {
    pub fn confirm_provisional(token: CorrelationToken) -> Self {
        Effect::ConfirmMessage {
            id: MessageId::Local(token),
        }
    }

    pub fn remove_provisional(token: CorrelationToken) -> Self {
        Effect::RemoveMessage {
            id: MessageId::Local(token),
        }
    }

    /// User-facing error for a failed dispatch
    pub fn dispatch_failed(message: &str) -> Self {
        Effect::RecordError {
            message: format!("Failed to send message: {message}"),
        }
    }
}
