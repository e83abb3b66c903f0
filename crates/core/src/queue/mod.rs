//! Per-stage work queues.
//!
//! Each automatic stage has one logical queue of work items; enqueueing is
//! an upsert keyed by (stage, artifact, sub-unit) so a resubmission replaces
//! the live item instead of duplicating it. The queue is the outbox an
//! out-of-process worker polls; its record shape is the only contract with
//! that worker.

mod sqlite;
mod types;

pub use sqlite::SqliteWorkQueue;
pub use types::{UpsertOutcome, WorkItem};

/// Error type for work queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for work queue backends.
pub trait WorkQueue: Send + Sync {
    /// Insert or replace the work item for this item's key at `stage`.
    fn upsert(&self, stage: &str, item: WorkItem) -> Result<UpsertOutcome, QueueError>;

    /// Remove the work item for the given key. Returns true if one existed.
    fn remove(
        &self,
        stage: &str,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
    ) -> Result<bool, QueueError>;

    /// Get the live work item for the given key, if any.
    fn get(
        &self,
        stage: &str,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
    ) -> Result<Option<WorkItem>, QueueError>;

    /// List all live work items at `stage` in enqueue order.
    fn list(&self, stage: &str) -> Result<Vec<WorkItem>, QueueError>;
}
