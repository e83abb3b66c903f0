use std::sync::Arc;

use tokio::sync::broadcast;

use crate::notify::NotificationStore;

use super::{ConnectionRegistry, EventChannel, EventMessage};

/// Consumes the event channel and fans events out to live sockets.
///
/// Task sockets receive the bare state string; user sockets receive the
/// full JSON payload. Notification events are additionally persisted so a
/// user who is offline still finds them in the inbox.
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            registry,
            notifications,
        }
    }

    /// Spawn the dispatch loop on a fresh subscription of `channel`.
    pub fn spawn(self, channel: &EventChannel) -> tokio::task::JoinHandle<()> {
        let receiver = channel.subscribe();
        tokio::spawn(self.run(receiver))
    }

    pub async fn run(self, mut receiver: broadcast::Receiver<EventMessage>) {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event dispatcher lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event channel closed, dispatcher stopping");
                    return;
                }
            };
            self.handle(event).await;
        }
    }

    async fn handle(&self, event: EventMessage) {
        if let Some(task_key) = event.task_routing_key() {
            let delivered = self.registry.dispatch(&task_key, event.state()).await;
            tracing::debug!(?task_key, delivered, "dispatched task update");
        }

        match serde_json::to_string(&event) {
            Ok(payload) => {
                let user_key = event.user_routing_key();
                let delivered = self.registry.dispatch(&user_key, &payload).await;
                tracing::debug!(?user_key, delivered, "dispatched user event");
            }
            Err(error) => {
                tracing::error!(%error, "failed to serialize event payload");
            }
        }

        if let EventMessage::Notification {
            username, state, ..
        } = &event
        {
            match self.notifications.append(username, state) {
                Ok(_) => crate::metrics::NOTIFICATIONS_PERSISTED.inc(),
                Err(error) => {
                    tracing::error!(username, %error, "failed to persist notification");
                }
            }
        }
    }
}
