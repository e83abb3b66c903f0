use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Artifact, ArtifactError, ArtifactStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artifacts (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artifacts_kind ON artifacts(kind);
"#;

/// SQLite-backed artifact store. Each artifact is one row holding the full
/// document as JSON; the pipeline reads and writes whole documents.
pub struct SqliteArtifactStore {
    conn: Mutex<Connection>,
}

impl SqliteArtifactStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ArtifactError> {
        let conn = Connection::open(path).map_err(|e| ArtifactError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, ArtifactError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ArtifactError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, ArtifactError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| ArtifactError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn decode(data: &str) -> Result<Artifact, ArtifactError> {
        serde_json::from_str(data).map_err(|e| ArtifactError::Serialization(e.to_string()))
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn insert(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        let conn = self.conn.lock().unwrap();
        let data = serde_json::to_string(artifact)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        conn.execute(
            "INSERT INTO artifacts (id, kind, updated_at, data) VALUES (?, ?, ?, ?)",
            params![
                artifact.id,
                artifact.kind.as_str(),
                artifact.updated_at.to_rfc3339(),
                data
            ],
        )
        .map_err(|e| ArtifactError::Database(e.to_string()))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Artifact>, ArtifactError> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM artifacts WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ArtifactError::Database(e.to_string()))?;

        match data {
            Some(data) => Ok(Some(Self::decode(&data)?)),
            None => Ok(None),
        }
    }

    fn update(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        let conn = self.conn.lock().unwrap();
        let data = serde_json::to_string(artifact)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        let changed = conn
            .execute(
                "UPDATE artifacts SET kind = ?, updated_at = ?, data = ? WHERE id = ?",
                params![
                    artifact.kind.as_str(),
                    Utc::now().to_rfc3339(),
                    data,
                    artifact.id
                ],
            )
            .map_err(|e| ArtifactError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(ArtifactError::NotFound(artifact.id.clone()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<Artifact, ArtifactError> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM artifacts WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ArtifactError::Database(e.to_string()))?;

        let data = data.ok_or_else(|| ArtifactError::NotFound(id.to_string()))?;
        conn.execute("DELETE FROM artifacts WHERE id = ?", params![id])
            .map_err(|e| ArtifactError::Database(e.to_string()))?;
        Self::decode(&data)
    }

    fn list(&self) -> Result<Vec<Artifact>, ArtifactError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT data FROM artifacts ORDER BY updated_at DESC")
            .map_err(|e| ArtifactError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ArtifactError::Database(e.to_string()))?;

        let mut artifacts = Vec::new();
        for row in rows {
            let data = row.map_err(|e| ArtifactError::Database(e.to_string()))?;
            artifacts.push(Self::decode(&data)?);
        }
        Ok(artifacts)
    }
}
