//! Notification inbox API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use atelier_core::notify::{NotificationRecord, NotifyError};

use super::artifacts::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsParams {
    /// When true, return only unread notifications.
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: usize,
}

/// List a user's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<ListNotificationsParams>,
) -> Result<Json<Vec<NotificationRecord>>, (StatusCode, Json<ErrorResponse>)> {
    match state.notifications().list(&username, params.unread) {
        Ok(records) => Ok(Json(records)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}

/// Mark one notification read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path((username, id)): Path<(String, i64)>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match state.notifications().mark_read(&username, id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(NotifyError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Notification not found: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}

/// Mark all of a user's notifications read.
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<MarkAllReadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.notifications().mark_all_read(&username) {
        Ok(marked) => Ok(Json(MarkAllReadResponse { marked })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}
