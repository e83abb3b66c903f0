//! HTTP and WebSocket surface of the atelier pipeline service.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
