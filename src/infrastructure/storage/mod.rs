//! In-memory record store for dev mode and tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{RecordPatch, UserRecord};
use crate::domain::traits::UserStore;

/// In-memory [`UserStore`]. The whole map sits behind one RwLock, so an
/// upsert holds the write lock across its read-modify-write and the
/// merge-or-create is atomic per identity.
pub struct MemoryStore {
    records: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, identity: &str) -> Result<Option<UserRecord>, StorageError> {
        let records = self.records.read().await;
        Ok(records.get(identity).cloned())
    }

    async fn upsert(&self, identity: &str, patch: RecordPatch) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        match records.get_mut(identity) {
            Some(record) => patch.apply_to(record),
            None => {
                records.insert(identity.to_string(), patch.into_record());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_absent_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_creates_then_merges() {
        let store = MemoryStore::new();
        store
            .upsert("42", RecordPatch::new().with_password_hash("abc"))
            .await
            .unwrap();
        store
            .upsert("42", RecordPatch::new().with_logged_in(true))
            .await
            .unwrap();

        let record = store.get("42").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "abc");
        assert!(record.logged_in);
        assert!(!record.privileged);
    }

    #[tokio::test]
    async fn identities_are_independent() {
        let store = MemoryStore::new();
        store
            .upsert("1", RecordPatch::new().with_password_hash("a"))
            .await
            .unwrap();
        store
            .upsert("2", RecordPatch::new().with_password_hash("b"))
            .await
            .unwrap();

        assert_eq!(store.get("1").await.unwrap().unwrap().password_hash, "a");
        assert_eq!(store.get("2").await.unwrap().unwrap().password_hash, "b");
    }
}
