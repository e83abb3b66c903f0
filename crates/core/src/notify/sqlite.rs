use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{NotificationRecord, NotificationStore, NotifyError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    creation_date TEXT NOT NULL,
    message TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_notifications_username ON notifications(username);
"#;

/// SQLite-backed notification inbox.
pub struct SqliteNotificationStore {
    conn: Mutex<Connection>,
}

impl SqliteNotificationStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, NotifyError> {
        let conn = Connection::open(path).map_err(|e| NotifyError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, NotifyError> {
        let conn =
            Connection::open_in_memory().map_err(|e| NotifyError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, NotifyError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| NotifyError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl NotificationStore for SqliteNotificationStore {
    fn append(&self, username: &str, message: &str) -> Result<NotificationRecord, NotifyError> {
        let conn = self.conn.lock().unwrap();
        let creation_date = Utc::now();
        conn.execute(
            "INSERT INTO notifications (username, creation_date, message, read) VALUES (?, ?, ?, 0)",
            params![username, creation_date.to_rfc3339(), message],
        )
        .map_err(|e| NotifyError::Database(e.to_string()))?;

        Ok(NotificationRecord {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            creation_date,
            message: message.to_string(),
            read: false,
        })
    }

    fn list(
        &self,
        username: &str,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, NotifyError> {
        let conn = self.conn.lock().unwrap();
        let sql = if unread_only {
            "SELECT id, username, creation_date, message, read FROM notifications
             WHERE username = ? AND read = 0 ORDER BY id DESC"
        } else {
            "SELECT id, username, creation_date, message, read FROM notifications
             WHERE username = ? ORDER BY id DESC"
        };
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| NotifyError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![username], |row| {
                let creation_date: String = row.get(2)?;
                Ok(NotificationRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    creation_date: creation_date
                        .parse::<DateTime<Utc>>()
                        .unwrap_or_else(|_| Utc::now()),
                    message: row.get(3)?,
                    read: row.get::<_, i64>(4)? != 0,
                })
            })
            .map_err(|e| NotifyError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| NotifyError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn mark_read(&self, username: &str, id: i64) -> Result<(), NotifyError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE id = ? AND username = ?",
                params![id, username],
            )
            .map_err(|e| NotifyError::Database(e.to_string()))?;
        if changed == 0 {
            return Err(NotifyError::NotFound(id));
        }
        Ok(())
    }

    fn mark_all_read(&self, username: &str) -> Result<usize, NotifyError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE notifications SET read = 1 WHERE username = ? AND read = 0",
            params![username],
        )
        .map_err(|e| NotifyError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_list_newest_first() {
        let store = SqliteNotificationStore::in_memory().unwrap();
        store.append("alice", "first").unwrap();
        store.append("alice", "second").unwrap();
        store.append("bob", "other").unwrap();

        let records = store.list("alice", false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "second");
        assert_eq!(records[1].message, "first");
    }

    #[test]
    fn test_mark_read_and_unread_filter() {
        let store = SqliteNotificationStore::in_memory().unwrap();
        let first = store.append("alice", "first").unwrap();
        store.append("alice", "second").unwrap();

        store.mark_read("alice", first.id).unwrap();

        let unread = store.list("alice", true).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "second");
    }

    #[test]
    fn test_mark_read_is_scoped_to_user() {
        let store = SqliteNotificationStore::in_memory().unwrap();
        let record = store.append("alice", "hers").unwrap();
        assert!(matches!(
            store.mark_read("bob", record.id),
            Err(NotifyError::NotFound(_))
        ));
    }

    #[test]
    fn test_mark_all_read_counts_changes() {
        let store = SqliteNotificationStore::in_memory().unwrap();
        store.append("alice", "a").unwrap();
        store.append("alice", "b").unwrap();

        assert_eq!(store.mark_all_read("alice").unwrap(), 2);
        assert_eq!(store.mark_all_read("alice").unwrap(), 0);
        assert!(store.list("alice", true).unwrap().is_empty());
    }
}
