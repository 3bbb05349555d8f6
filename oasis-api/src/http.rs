use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::gateway::ChatUpdate;
use crate::state::AppState;

const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/updates", post(receive_update))
        .route("/healthz", get(health))
}

async fn health() -> &'static str {
    "ok"
}

/// Inbound webhook from the chat relay. The shared secret gates the
/// endpoint; accepted updates are handed to the session router and
/// acknowledged immediately, handling happens on the requester's worker.
async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ChatUpdate>,
) -> Result<StatusCode, AppError> {
    let presented = headers
        .get(GATEWAY_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing gateway secret".to_string()))?;

    if presented != state.webhook_secret {
        return Err(AppError::Unauthorized("Invalid gateway secret".to_string()));
    }

    state.sessions.dispatch(update).await;
    Ok(StatusCode::ACCEPTED)
}
