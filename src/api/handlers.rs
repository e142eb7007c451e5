//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, QueuedResponse, RecordRequest};
use super::AppState;
use crate::session::{Motion, SessionState};
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
        // Session snapshot
        .route("/api/session", get(get_session))
        // SSE streaming
        .route("/api/session/stream", get(stream_session))
        // Operator intents
        .route("/api/session/record", post(record))
        .route("/api/session/stop-recording", post(stop_recording))
        .route("/api/session/train", post(train))
        .route("/api/session/inference", post(toggle_inference))
        // Version
        .route("/api/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Snapshot
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.handle.session())
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    sse_stream(state.handle.subscribe())
}

// ============================================================
// Operator Intents
// ============================================================
//
// Intents are fire-and-forget: a guard rejection surfaces through the state
// stream as last_error, not as an HTTP error. The only HTTP failure is a
// dead session runtime.

async fn record(
    State(state): State<AppState>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .handle
        .begin_recording(Motion::new(req.motion))
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn stop_recording(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state
        .handle
        .end_recording()
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn train(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state.handle.train().await.map_err(AppError::Internal)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn toggle_inference(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state
        .handle
        .toggle_inference()
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(QueuedResponse { queued: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("neurodrive ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
