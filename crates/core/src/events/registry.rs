use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::RoutingKey;

struct Connection {
    id: u64,
    tx: mpsc::Sender<String>,
}

/// Live websocket connections indexed by routing key.
///
/// A key can hold several connections (the same user with two browser
/// tabs); dispatch fans out to all of them. Sends are non-blocking: a
/// closed peer is evicted on the spot and a full peer skips the message,
/// so one stuck socket never stalls the dispatcher.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<RoutingKey, Vec<Connection>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under `key`. Returns a handle to pass to
    /// [`unregister`](Self::unregister) when the socket closes.
    pub async fn register(&self, key: RoutingKey, tx: mpsc::Sender<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.write().await;
        connections.entry(key).or_default().push(Connection { id, tx });
        id
    }

    pub async fn unregister(&self, key: &RoutingKey, id: u64) {
        let mut connections = self.connections.write().await;
        if let Some(entries) = connections.get_mut(key) {
            entries.retain(|c| c.id != id);
            if entries.is_empty() {
                connections.remove(key);
            }
        }
    }

    /// Send `message` to every connection under `key`. Returns the number
    /// of connections the message was handed to.
    pub async fn dispatch(&self, key: &RoutingKey, message: &str) -> usize {
        let mut connections = self.connections.write().await;
        let Some(entries) = connections.get_mut(key) else {
            return 0;
        };

        let mut delivered = 0;
        entries.retain(|conn| match conn.tx.try_send(message.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(?key, "connection send buffer full, dropping message");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(?key, "evicting closed connection");
                false
            }
        });
        if entries.is_empty() {
            connections.remove(key);
        }
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }
}
