//! Dispatch error types

use thiserror::Error;

/// Dispatch error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Network, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Status(code), message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::MalformedBody, message)
    }
}

/// Error classification. Used for diagnostics only; every kind is
/// handled the same way by the conversation store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// DNS, connect, timeout or body read failure
    Network,
    /// Response arrived with a non-2xx status
    Status(u16),
    /// Success body could not be decoded
    MalformedBody,
}

impl DispatchErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "network_unreachable",
            Self::Status(_) => "non_2xx_status",
            Self::MalformedBody => "malformed_response_body",
        }
    }
}
