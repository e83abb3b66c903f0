use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{artifacts, events, handlers, middleware, notifications, pipeline, queues, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Artifacts
        .route("/artifacts", post(artifacts::create_artifact))
        .route("/artifacts", get(artifacts::list_artifacts))
        .route("/artifacts/{id}", get(artifacts::get_artifact))
        .route("/artifacts/{id}", delete(artifacts::delete_artifact))
        // Pipeline
        .route("/artifacts/{id}/submit", post(pipeline::submit))
        .route("/artifacts/{id}/unpublish", post(pipeline::unpublish))
        .route("/artifacts/{id}/review", post(pipeline::save_review))
        // Worker surface
        .route("/queues/{stage}", get(queues::list_queue))
        .route("/events", post(events::publish_event))
        // Notifications
        .route("/notifications/{username}", get(notifications::list_notifications))
        .route(
            "/notifications/{username}/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/notifications/{username}/{id}/read",
            post(notifications::mark_read),
        )
        .with_state(state.clone());

    // WebSocket routes sit outside the versioned API prefix
    let ws_routes = Router::new()
        .route("/ws/tasks/{username}/{task_id}", get(ws::ws_tasks))
        .route("/ws/notifications/{username}", get(ws::ws_notifications))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(ws_routes)
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
