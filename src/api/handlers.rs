//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, PersonasResponse, SelectPersonaRequest,
    SuccessResponse,
};
use super::AppState;
use crate::runtime::{RuntimeError, SseEvent};
use crate::store::Snapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Character selection
        .route("/api/personas", get(list_personas))
        .route("/api/persona", post(select_persona))
        // Conversation read access
        .route("/api/conversation", get(get_conversation))
        .route("/api/stream", get(stream_conversation))
        // User actions
        .route("/api/chat", post(send_chat))
        .route("/api/reset", post(reset_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Character Selection
// ============================================================

async fn list_personas(State(state): State<AppState>) -> Result<Json<PersonasResponse>, AppError> {
    let snapshot = state.session.snapshot().await?;
    Ok(Json(PersonasResponse {
        personas: state.roster.personas().to_vec(),
        selected: snapshot.persona,
    }))
}

async fn select_persona(
    State(state): State<AppState>,
    Json(req): Json<SelectPersonaRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Persona name is required".to_string()));
    }

    let persona = state.roster.resolve(&req.name);
    state.session.select_persona(persona).await?;
    Ok(Json(SuccessResponse { ok: true }))
}

// ============================================================
// Conversation Read Access
// ============================================================

async fn get_conversation(State(state): State<AppState>) -> Result<Json<Snapshot>, AppError> {
    Ok(Json(state.session.snapshot().await?))
}

async fn stream_conversation(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.session.attach().await?;
    Ok(sse_stream(SseEvent::Init { snapshot }, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let accepted = state.session.submit(req.text).await?;
    Ok(Json(ChatResponse { accepted }))
}

async fn reset_conversation(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.session.reset().await?;
    Ok(Json(SuccessResponse { ok: true }))
}

async fn get_version() -> &'static str {
    concat!("online-counsel ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
