//! HTTP endpoints: the public session listing and the game page probe.
//!
//! The listing backs the lobby view; the game page route only has to answer
//! "does this session still exist", returning 404 once a session has been
//! reclaimed so stale links fall back to the lobby.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use skewer_coordinator::CoordinatorHandle;
use skewer_protocol::SessionId;

/// Builds the HTTP router over a coordinator handle.
pub fn router(coordinator: CoordinatorHandle) -> Router {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/game/{id}", get(game_page))
        .with_state(coordinator)
}

/// `GET /sessions` — every session currently in playing status.
async fn list_sessions(State(coordinator): State<CoordinatorHandle>) -> Response {
    match coordinator.session_list().await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(error) => {
            tracing::error!(%error, "session listing unavailable");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// `GET /game/{id}` — the game page shell, or 404 for an id that is not in
/// the registry right now.
async fn game_page(
    State(coordinator): State<CoordinatorHandle>,
    Path(id): Path<String>,
) -> Response {
    let session_id = SessionId::new(id);
    match coordinator.session_exists(session_id.clone()).await {
        Ok(true) => Html(format!(
            "<!doctype html><html><head><title>Skewer</title></head>\
             <body data-session-id=\"{session_id}\"></body></html>"
        ))
        .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "session not found").into_response(),
        Err(error) => {
            tracing::error!(%error, "game page lookup unavailable");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
