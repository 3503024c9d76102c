//! Events that can occur in a conversation

use crate::dispatch::DispatchError;
use crate::message::{CorrelationToken, Message};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// Optimistic user message; its local id is the new correlation token
    UserSubmit { message: Message },
    Reset,

    // Dispatch events
    DispatchSucceeded {
        reply: Message,
        token: CorrelationToken,
    },
    DispatchFailed {
        error: DispatchError,
        token: CorrelationToken,
    },
}
