use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::{RecordPatch, UserRecord};

/// UserStore trait - abstraction over the durable authentication record
/// store, keyed by chat identity.
///
/// An absent record is the normal "never registered" case and comes back
/// as `Ok(None)`, never as an error. `upsert` is merge-or-create and must
/// be atomic per identity: two concurrent upserts for the same identity
/// may not interleave partial writes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, identity: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Create the record from `patch` (omitted fields defaulted) if none
    /// exists, otherwise merge only the fields the patch sets.
    async fn upsert(&self, identity: &str, patch: RecordPatch) -> Result<(), StorageError>;
}
