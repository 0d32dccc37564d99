//! Key-value store adapter consumed by the repositories.
//!
//! Entities are persisted as opaque byte blobs under generated keys; the
//! waiting queue is a named FIFO list. Backends carry no game semantics.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::Duration;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::storage::StorageResult;

/// Abstraction over the shared external store.
///
/// Per-key operations are assumed atomic by callers; compound sequences
/// (load, mutate, store) are not, and the protocol tolerates that.
pub trait KeyValueStore: Send + Sync {
    /// Mint a globally unique key for a new entity.
    fn generate_key(&self) -> Uuid;
    /// Store an opaque blob under `key`, optionally expiring after `ttl`.
    fn put(
        &self,
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Retrieve the blob stored under `key`, if any.
    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>>;
    /// Whether `key` currently holds a live (non-expired) entry.
    fn exists(&self, key: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop the entry stored under `key`, if any.
    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Number of elements in the named list.
    fn list_len(&self, name: String) -> BoxFuture<'static, StorageResult<usize>>;
    /// Append a value to the tail of the named list.
    fn list_push_back(&self, name: String, value: String)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Pop the oldest value off the named list.
    fn list_pop_front(&self, name: String) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Copy of the named list, oldest first.
    fn list_snapshot(&self, name: String) -> BoxFuture<'static, StorageResult<Vec<String>>>;
    /// Remove all occurrences of `value` from the named list.
    fn list_remove(&self, name: String, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
