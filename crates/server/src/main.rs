use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_core::artifact::{ArtifactStore, SqliteArtifactStore};
use atelier_core::config::load_config;
use atelier_core::events::{ConnectionRegistry, EventChannel, NotificationDispatcher};
use atelier_core::migrate::{FsObjectStore, ObjectStore, ResourceMigrator};
use atelier_core::notify::{NotificationStore, SqliteNotificationStore};
use atelier_core::pipeline::PipelineController;
use atelier_core::queue::{SqliteWorkQueue, WorkQueue};

use atelier_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("ATELIER_CONFIG").map(PathBuf::from).ok();

    info!("Starting atelier {}", VERSION);
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No ATELIER_CONFIG set, using defaults and environment"),
    }
    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Log a stable fingerprint of the effective configuration
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);
    info!("Database path: {:?}", config.database.path);
    info!("Storage root: {:?}", config.storage.root);

    // Stores share one SQLite database file
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(
        SqliteArtifactStore::new(&config.database.path)
            .context("Failed to create artifact store")?,
    );
    info!("Artifact store initialized");

    let queue: Arc<dyn WorkQueue> = Arc::new(
        SqliteWorkQueue::new(&config.database.path).context("Failed to create work queue")?,
    );
    info!("Work queue initialized");

    let notifications: Arc<dyn NotificationStore> = Arc::new(
        SqliteNotificationStore::new(&config.database.path)
            .context("Failed to create notification store")?,
    );
    info!("Notification store initialized");

    // Object store + migrator
    let objects: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(config.storage.root.clone()));
    let migrator = ResourceMigrator::new(objects, config.storage.prefix.clone());

    // Event channel, connection registry, and the dispatcher task
    let events = EventChannel::new(config.events.capacity);
    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&registry), Arc::clone(&notifications));
    let dispatcher_handle = dispatcher.spawn(&events);
    info!("Notification dispatcher started");

    let controller = PipelineController::new(Arc::clone(&artifacts), Arc::clone(&queue), migrator)
        .with_events(events.clone());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        artifacts,
        queue,
        notifications,
        controller,
        events,
        registry,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    dispatcher_handle.abort();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
