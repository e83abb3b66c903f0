//! Persistent per-user notification inbox.

mod sqlite;

pub use sqlite::SqliteNotificationStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for notification storage.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// No notification with that id for that user.
    #[error("Notification not found: {0}")]
    NotFound(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// One stored notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRecord {
    pub id: i64,
    pub username: String,
    pub creation_date: DateTime<Utc>,
    pub message: String,
    pub read: bool,
}

/// Trait for notification inbox backends.
pub trait NotificationStore: Send + Sync {
    /// Append an unread notification for `username`.
    fn append(&self, username: &str, message: &str) -> Result<NotificationRecord, NotifyError>;

    /// List notifications for `username`, newest first.
    fn list(&self, username: &str, unread_only: bool) -> Result<Vec<NotificationRecord>, NotifyError>;

    /// Mark one notification read.
    fn mark_read(&self, username: &str, id: i64) -> Result<(), NotifyError>;

    /// Mark every notification for `username` read. Returns how many changed.
    fn mark_all_read(&self, username: &str) -> Result<usize, NotifyError>;
}
