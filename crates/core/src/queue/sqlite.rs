use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{QueueError, UpsertOutcome, WorkItem, WorkQueue};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS work_items (
    stage TEXT NOT NULL,
    artifact_id TEXT NOT NULL,
    sub_unit_id TEXT NOT NULL DEFAULT '',
    instructions TEXT,
    enqueued_at TEXT NOT NULL,
    PRIMARY KEY (stage, artifact_id, sub_unit_id)
);

CREATE INDEX IF NOT EXISTS idx_work_items_stage ON work_items(stage);
"#;

/// SQLite-backed work queue. One table keyed by (stage, artifact, sub-unit);
/// the stage column plays the role of the per-stage collection name.
pub struct SqliteWorkQueue {
    conn: Mutex<Connection>,
}

impl SqliteWorkQueue {
    /// Create a new queue, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory queue (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, QueueError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_item(
        artifact_id: String,
        sub_unit_id: String,
        instructions: Option<String>,
        enqueued_at: String,
    ) -> WorkItem {
        WorkItem {
            artifact_id,
            sub_unit_id: if sub_unit_id.is_empty() {
                None
            } else {
                Some(sub_unit_id)
            },
            instructions,
            enqueued_at: enqueued_at
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl WorkQueue for SqliteWorkQueue {
    fn upsert(&self, stage: &str, item: WorkItem) -> Result<UpsertOutcome, QueueError> {
        let conn = self.conn.lock().unwrap();
        let sub_unit = item.sub_unit_id.clone().unwrap_or_default();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM work_items WHERE stage = ? AND artifact_id = ? AND sub_unit_id = ?",
                params![stage, item.artifact_id, sub_unit],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO work_items (stage, artifact_id, sub_unit_id, instructions, enqueued_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(stage, artifact_id, sub_unit_id)
            DO UPDATE SET instructions = excluded.instructions, enqueued_at = excluded.enqueued_at
            "#,
            params![
                stage,
                item.artifact_id,
                sub_unit,
                item.instructions,
                item.enqueued_at.to_rfc3339()
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(if existing.is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn remove(
        &self,
        stage: &str,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
    ) -> Result<bool, QueueError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "DELETE FROM work_items WHERE stage = ? AND artifact_id = ? AND sub_unit_id = ?",
                params![stage, artifact_id, sub_unit_id.unwrap_or_default()],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    fn get(
        &self,
        stage: &str,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
    ) -> Result<Option<WorkItem>, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT artifact_id, sub_unit_id, instructions, enqueued_at
            FROM work_items WHERE stage = ? AND artifact_id = ? AND sub_unit_id = ?
            "#,
            params![stage, artifact_id, sub_unit_id.unwrap_or_default()],
            |row| {
                Ok(Self::row_to_item(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            },
        )
        .optional()
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn list(&self, stage: &str) -> Result<Vec<WorkItem>, QueueError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT artifact_id, sub_unit_id, instructions, enqueued_at
                FROM work_items WHERE stage = ? ORDER BY enqueued_at ASC
                "#,
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![stage], |row| {
                Ok(Self::row_to_item(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            })
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| QueueError::Database(e.to_string()))?);
        }
        Ok(items)
    }
}
