pub mod artifacts;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod pipeline;
pub mod queues;
pub mod routes;
pub mod ws;

pub use routes::create_router;
