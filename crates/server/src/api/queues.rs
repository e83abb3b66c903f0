//! Work queue API handlers (worker poll surface).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use atelier_core::queue::WorkItem;

use super::artifacts::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListQueueResponse {
    pub stage: String,
    pub items: Vec<WorkItem>,
}

/// List the live work items at one stage, in enqueue order.
pub async fn list_queue(
    State(state): State<Arc<AppState>>,
    Path(stage): Path<String>,
) -> Result<Json<ListQueueResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.queue().list(&stage) {
        Ok(items) => Ok(Json(ListQueueResponse { stage, items })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}
