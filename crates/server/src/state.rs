use std::sync::Arc;

use atelier_core::artifact::ArtifactStore;
use atelier_core::config::Config;
use atelier_core::events::{ConnectionRegistry, EventChannel};
use atelier_core::notify::NotificationStore;
use atelier_core::pipeline::PipelineController;
use atelier_core::queue::WorkQueue;

/// Shared application state
pub struct AppState {
    config: Config,
    artifacts: Arc<dyn ArtifactStore>,
    queue: Arc<dyn WorkQueue>,
    notifications: Arc<dyn NotificationStore>,
    controller: PipelineController,
    events: EventChannel,
    registry: Arc<ConnectionRegistry>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        artifacts: Arc<dyn ArtifactStore>,
        queue: Arc<dyn WorkQueue>,
        notifications: Arc<dyn NotificationStore>,
        controller: PipelineController,
        events: EventChannel,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config,
            artifacts,
            queue,
            notifications,
            controller,
            events,
            registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn artifacts(&self) -> &dyn ArtifactStore {
        self.artifacts.as_ref()
    }

    pub fn queue(&self) -> &dyn WorkQueue {
        self.queue.as_ref()
    }

    pub fn notifications(&self) -> &dyn NotificationStore {
        self.notifications.as_ref()
    }

    pub fn controller(&self) -> &PipelineController {
        &self.controller
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
