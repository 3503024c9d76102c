//! HTTP client for the external respond endpoint

use super::types::{DispatchRequest, Reply, ReplyFormat, WireMessage, WireRequest};
use super::{DispatchError, Responder};
use crate::message::{Part, Role};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Responder that POSTs to the respond endpoint
pub struct HttpResponder {
    client: Client,
    url: String,
    reply_format: ReplyFormat,
}

impl HttpResponder {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        reply_format: ReplyFormat,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            reply_format,
        })
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn respond(&self, request: &DispatchRequest) -> Result<Reply, DispatchError> {
        let wire_request = WireRequest::from_request(request);

        let response = self
            .client
            .post(&self.url)
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    DispatchError::network(format!("Connection failed: {e}"))
                } else {
                    DispatchError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = error_message(status, content_type.as_deref(), &body);
            return Err(DispatchError::status(status.as_u16(), message));
        }

        normalize_reply(&body, self.reply_format)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Pick the most useful message out of a failed response.
///
/// JSON objects yield their `message` field (or the whole object when that
/// is missing); other bodies are used verbatim; empty bodies, unparseable
/// JSON and JSON that is not an object fall back to a generic status line.
pub(crate) fn error_message(status: StatusCode, content_type: Option<&str>, body: &str) -> String {
    let fallback = format!("API request failed with status {}", status.as_u16());

    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) if value.is_object() => value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map_or_else(|| value.to_string(), str::to_owned),
            Ok(_) => fallback,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse error response body");
                fallback
            }
        };
    }

    if body.trim().is_empty() {
        fallback
    } else {
        body.to_string()
    }
}

/// Decode a success body into a reply
pub(crate) fn normalize_reply(body: &str, format: ReplyFormat) -> Result<Reply, DispatchError> {
    match format {
        ReplyFormat::PlainText => {
            if body.is_empty() {
                return Err(DispatchError::malformed("Empty response body"));
            }
            Ok(Reply {
                id: None,
                content: vec![Part::text(body)],
            })
        }
        ReplyFormat::Structured => {
            let wire: WireMessage = serde_json::from_str(body)
                .map_err(|e| DispatchError::malformed(format!("Failed to parse response: {e}")))?;

            if wire.role != Role::Model {
                return Err(DispatchError::malformed(format!(
                    "Expected a model reply, got role {}",
                    wire.role.as_str()
                )));
            }
            if wire.part.is_empty() {
                return Err(DispatchError::malformed("Reply contained no parts"));
            }

            Ok(Reply {
                id: wire.id.filter(|id| !id.is_empty()),
                content: wire.part,
            })
        }
    }
}
