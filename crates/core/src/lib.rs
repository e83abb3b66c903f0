//! Core of the atelier content production pipeline: stage catalogs, the
//! artifact model, the pipeline controller, resource migration, work
//! queues, and live event fan-out. The server crate wires these behind an
//! HTTP and websocket surface.

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod events;
pub mod metrics;
pub mod migrate;
pub mod notify;
pub mod pipeline;
pub mod queue;
pub mod testing;
