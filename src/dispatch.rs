//! Message dispatcher
//!
//! Performs exactly one outbound call per submission and reports the
//! outcome tagged with the submission's correlation token.

mod error;
mod http;
mod types;

pub use error::{DispatchError, DispatchErrorKind};
pub use http::HttpResponder;
pub use types::{DispatchRequest, Reply, ReplyFormat};

use crate::message::{CorrelationToken, Message, MessageId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The external "respond" capability
#[async_trait]
pub trait Responder: Send + Sync {
    /// Make one call. Must not retry.
    async fn respond(&self, request: &DispatchRequest) -> Result<Reply, DispatchError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, request: &DispatchRequest) -> Result<Reply, DispatchError> {
        (**self).respond(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for responders
pub struct LoggingResponder {
    inner: Arc<dyn Responder>,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn Responder>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Responder for LoggingResponder {
    async fn respond(&self, request: &DispatchRequest) -> Result<Reply, DispatchError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    token = %request.token,
                    duration_ms = %duration.as_millis(),
                    history_len = request.history.len(),
                    parts = reply.content.len(),
                    "Respond call completed"
                );
            }
            Err(e) => {
                let status = match e.kind {
                    DispatchErrorKind::Status(code) => Some(code),
                    DispatchErrorKind::Network | DispatchErrorKind::MalformedBody => None,
                };
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    token = %request.token,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.label(),
                    status = ?status,
                    error = %e.message,
                    "Respond call failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

/// Result of one dispatch, always tagged with its correlation token
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Success {
        reply: Message,
        token: CorrelationToken,
    },
    Failure {
        error: DispatchError,
        token: CorrelationToken,
    },
}

impl DispatchOutcome {
    pub fn token(&self) -> CorrelationToken {
        match self {
            DispatchOutcome::Success { token, .. } | DispatchOutcome::Failure { token, .. } => {
                *token
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }
}

/// Turns a `DispatchRequest` into exactly one `DispatchOutcome`
pub struct Dispatcher {
    responder: Arc<dyn Responder>,
    next_sequence: AtomicU64,
}

impl Dispatcher {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            next_sequence: AtomicU64::new(1),
        }
    }

    pub async fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        let token = request.token;
        match self.responder.respond(request).await {
            Ok(reply) => {
                let id = match reply.id {
                    Some(id) => MessageId::Remote(id),
                    None => MessageId::Sequence(self.next_sequence.fetch_add(1, Ordering::Relaxed)),
                };
                DispatchOutcome::Success {
                    reply: Message::model(id, reply.content),
                    token,
                }
            }
            Err(error) => DispatchOutcome::Failure { error, token },
        }
    }
}
