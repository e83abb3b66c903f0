//! Progress events and live fan-out.
//!
//! Pipeline transitions and worker completions are published on one
//! in-process broadcast channel. A dispatcher task consumes the channel,
//! routes each event to the websocket connections registered under its
//! routing key, and persists notification events for offline readers.

mod channel;
mod dispatcher;
mod message;
mod registry;

pub use channel::EventChannel;
pub use dispatcher::NotificationDispatcher;
pub use message::{EventMessage, RoutingKey};
pub use registry::ConnectionRegistry;
