//! SQLite record store

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::entities::{RecordPatch, UserRecord};
use crate::domain::traits::UserStore;

/// Durable [`UserStore`] backed by a local SQLite database.
///
/// The connection sits behind a mutex held across each read-modify-write,
/// which serializes upserts and keeps the merge-or-create atomic per
/// identity. Store access is local and quick; no async I/O is needed.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Private database, handy for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.lock_conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                identity TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                login INTEGER NOT NULL DEFAULT 0,
                privileged INTEGER NOT NULL DEFAULT 0,
                awaiting_password INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("connection lock poisoned: {}", e)))
    }

    fn query_record(
        conn: &Connection,
        identity: &str,
    ) -> Result<Option<UserRecord>, rusqlite::Error> {
        conn.query_row(
            "SELECT password_hash, login, privileged, awaiting_password
             FROM users WHERE identity = ?1",
            [identity],
            |row| {
                Ok(UserRecord {
                    password_hash: row.get(0)?,
                    logged_in: row.get(1)?,
                    privileged: row.get(2)?,
                    awaiting_password: row.get(3)?,
                })
            },
        )
        .optional()
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get(&self, identity: &str) -> Result<Option<UserRecord>, StorageError> {
        let conn = self.lock_conn()?;
        Ok(Self::query_record(&conn, identity)?)
    }

    async fn upsert(&self, identity: &str, patch: RecordPatch) -> Result<(), StorageError> {
        // The lock spans the read and the write, so concurrent upserts
        // for one identity cannot interleave.
        let conn = self.lock_conn()?;

        let merged = match Self::query_record(&conn, identity)? {
            Some(mut record) => {
                patch.apply_to(&mut record);
                record
            }
            None => patch.into_record(),
        };

        conn.execute(
            "INSERT INTO users (identity, password_hash, login, privileged, awaiting_password)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(identity) DO UPDATE SET
                password_hash = excluded.password_hash,
                login = excluded.login,
                privileged = excluded.privileged,
                awaiting_password = excluded.awaiting_password",
            rusqlite::params![
                identity,
                merged.password_hash,
                merged.logged_in,
                merged.privileged,
                merged.awaiting_password,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_identity_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_creates_with_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("42", RecordPatch::new().with_password_hash("cafe"))
            .await
            .unwrap();

        let record = store.get("42").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "cafe");
        assert!(!record.logged_in);
        assert!(!record.privileged);
        assert!(!record.awaiting_password);
    }

    #[tokio::test]
    async fn upsert_merges_partial_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("42", RecordPatch::new().with_password_hash("cafe"))
            .await
            .unwrap();
        store
            .upsert(
                "42",
                RecordPatch::new()
                    .with_logged_in(true)
                    .with_awaiting_password(false),
            )
            .await
            .unwrap();
        store
            .upsert("42", RecordPatch::new().with_privileged(true))
            .await
            .unwrap();

        let record = store.get("42").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "cafe");
        assert!(record.logged_in);
        assert!(record.privileged);
        assert!(!record.awaiting_password);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .upsert("42", RecordPatch::new().with_password_hash("cafe"))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let record = store.get("42").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "cafe");
    }
}
