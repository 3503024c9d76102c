//! Online counsel - a persona-driven counseling chat session
//!
//! A conversation store driven by a pure state machine, a dispatcher that
//! makes one outbound call per submission, and an HTTP/SSE surface for the UI.

mod api;
mod config;
mod dispatch;
mod message;
mod persona;
mod runtime;
mod state_machine;
mod store;

use api::{create_router, AppState};
use config::CounselConfig;
use dispatch::{Dispatcher, HttpResponder, LoggingResponder};
use persona::Roster;
use runtime::SessionHandle;
use store::ConversationStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "online_counsel=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = CounselConfig::from_env();
    tracing::info!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout.as_secs(),
        reply_format = ?config.reply_format,
        "Configuration loaded"
    );

    // Outbound path
    let responder = HttpResponder::new(
        config.api_url.clone(),
        config.request_timeout,
        config.reply_format,
    )?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(LoggingResponder::new(Arc::new(
        responder,
    )))));

    // Session
    let roster = Roster::default();
    let persona = roster.resolve(config.persona.as_deref().unwrap_or_default());
    tracing::info!(persona = %persona.name, "Initial persona");
    let session = SessionHandle::spawn(ConversationStore::new(persona), dispatcher);

    let state = AppState::new(session, roster);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Online counsel server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
