//! HTTP routes and handlers.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Request, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn};

use crate::error::ApiError;
use crate::state::AppState;
use debaterelay_core::{Turn, TurnReply};

/// Largest accepted `/debate-turn/` body. Base64 inflates a clip by a third,
/// so this admits several minutes of compressed audio.
pub const AUDIO_UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Body of `POST /debate-turn/`.
#[derive(Debug, Clone, Deserialize)]
pub struct DebateTurnRequest {
    /// Base64-encoded audio recording of the human debater.
    pub audio_data: String,
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            correlation_id = %request_id
        )
    });

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/debate-turn/",
            post(debate_turn).layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/debate-turn",
            post(debate_turn).layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/conversation_history/{conversation_id}",
            get(conversation_history),
        )
        .layer(trace_layer)
        // Any origin, method and header, with credentials.
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

pub async fn debate_turn(
    State(state): State<AppState>,
    body: Result<Json<DebateTurnRequest>, JsonRejection>,
) -> Result<Json<TurnReply>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected /debate-turn/ body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    state
        .orchestrator
        .handle_turn(&request.conversation_id, &request.audio_data)
        .await
        .map(Json)
        .map_err(|err| {
            if err.is_client_error() {
                warn!(conversation_id = %request.conversation_id, "Rejected /debate-turn/: {}", err);
            } else {
                error!(conversation_id = %request.conversation_id, "Error processing /debate-turn/: {}", err);
            }
            ApiError::from(err)
        })
}

pub async fn conversation_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    state
        .orchestrator
        .get_history(&conversation_id)
        .map(Json)
        .map_err(|err| {
            warn!(conversation_id = %conversation_id, "Conversation history lookup failed: {}", err);
            ApiError::from(err)
        })
}
