//! Runtime for the conversation session
//!
//! A single task owns the `ConversationStore` and processes UI commands and
//! dispatch outcomes one at a time. The outbound call is the only place the
//! session waits on the network, and it runs in its own task.

mod executor;


use executor::SessionRuntime;

use crate::dispatch::Dispatcher;
use crate::message::MessageId;
use crate::persona::Persona;
use crate::store::{ConversationStore, MessageView, Snapshot};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Requests from the presentation layer
#[derive(Debug)]
pub enum Command {
    Submit {
        text: String,
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    SelectPersona {
        persona: Persona,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    /// Snapshot plus a subscription taken at the same point in the event order
    Attach {
        reply: oneshot::Sender<(Snapshot, broadcast::Receiver<SseEvent>)>,
    },
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        snapshot: Snapshot,
    },
    Message {
        message: MessageView,
    },
    MessageRemoved {
        id: MessageId,
    },
    MessageConfirmed {
        id: MessageId,
    },
    StateChange {
        state: &'static str,
        in_flight: bool,
        last_error: Option<String>,
    },
    Error {
        message: String,
    },
    Reset {
        persona: Persona,
    },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Conversation runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Start a session runtime for `store` in the background
    pub fn spawn(store: ConversationStore, dispatcher: Arc<Dispatcher>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime = SessionRuntime::new(store, dispatcher, command_rx, broadcast_tx);
        tokio::spawn(runtime.run());

        Self { command_tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Submit user text. `Ok(false)` means the submission was ignored
    /// (blank text, or a dispatch already in flight).
    pub async fn submit(&self, text: impl Into<String>) -> Result<bool, RuntimeError> {
        let text = text.into();
        self.request(|reply| Command::Submit { text, reply }).await
    }

    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn select_persona(&self, persona: Persona) -> Result<(), RuntimeError> {
        self.request(|reply| Command::SelectPersona { persona, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Current state plus every update after it, with no overlap or gap
    pub async fn attach(
        &self,
    ) -> Result<(Snapshot, broadcast::Receiver<SseEvent>), RuntimeError> {
        self.request(|reply| Command::Attach { reply }).await
    }
}
