//! Server-Sent Events support
//!
//! A stream opens with an `init` snapshot. The events after it start exactly
//! where the snapshot ends, so a client applies them in order without
//! deduplicating. Messages are keyed by `id`: `message` appends,
//! `message_removed` drops a provisional entry, `message_confirmed` clears
//! its pending mark.

use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: SseEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move { Ok(sse_event_to_axum(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = sse_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn sse_event_payload(event: SseEvent) -> (&'static str, serde_json::Value) {
    match event {
        SseEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "conversation": snapshot
            }),
        ),
        SseEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SseEvent::MessageRemoved { id } => (
            "message_removed",
            json!({
                "type": "message_removed",
                "id": id
            }),
        ),
        SseEvent::MessageConfirmed { id } => (
            "message_confirmed",
            json!({
                "type": "message_confirmed",
                "id": id
            }),
        ),
        SseEvent::StateChange {
            state,
            in_flight,
            last_error,
        } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state,
                "in_flight": in_flight,
                "last_error": last_error
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
        SseEvent::Reset { persona } => (
            "reset",
            json!({
                "type": "reset",
                "persona": persona
            }),
        ),
    }
}
