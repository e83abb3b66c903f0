use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A queued unit of work for one automatic stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub artifact_id: String,
    /// Present for sub-unit-scoped stages, absent for artifact-level ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_unit_id: Option<String>,
    /// Free-form guidance for the generation worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(
        artifact_id: impl Into<String>,
        sub_unit_id: Option<String>,
        instructions: Option<String>,
    ) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            sub_unit_id,
            instructions,
            enqueued_at: Utc::now(),
        }
    }
}

/// Whether an upsert created a new item or replaced a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}
