//! Event publish endpoint for out-of-process workers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use atelier_core::events::EventMessage;

use crate::state::AppState;

/// Publish a progress event onto the channel. Workers call this when a
/// generation step finishes or fails; the dispatcher fans it out to the
/// relevant sockets and persists notification events.
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<EventMessage>,
) -> StatusCode {
    state.events().publish(event);
    StatusCode::ACCEPTED
}
