use tokio::sync::broadcast;

use super::EventMessage;

const DEFAULT_CAPACITY: usize = 256;

/// In-process broadcast channel for progress events.
///
/// Cloning shares the same channel. Publishing never blocks and never
/// fails; with no live subscribers the event is simply dropped, and a slow
/// subscriber lags rather than exerting backpressure on the pipeline.
#[derive(Clone)]
pub struct EventChannel {
    sender: broadcast::Sender<EventMessage>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: EventMessage) {
        tracing::debug!(username = event.username(), state = event.state(), "publishing event");
        crate::metrics::EVENTS_PUBLISHED
            .with_label_values(&[event.type_str()])
            .inc();
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let channel = EventChannel::default();
        let mut rx1 = channel.subscribe();
        let mut rx2 = channel.subscribe();

        channel.publish(EventMessage::task_update("alice", None, None, "s"));

        assert_eq!(rx1.recv().await.unwrap().username(), "alice");
        assert_eq!(rx2.recv().await.unwrap().username(), "alice");
    }

    #[test]
    fn test_publish_without_subscribers_is_a_noop() {
        let channel = EventChannel::new(8);
        channel.publish(EventMessage::notification("bob", None, None, "done"));
        assert_eq!(channel.subscriber_count(), 0);
    }
}
