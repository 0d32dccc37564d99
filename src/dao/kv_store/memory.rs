//! In-process store backend used in tests and as a single-node fallback.

use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{kv_store::KeyValueStore, storage::StorageResult};

struct StoredEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

#[derive(Default)]
struct MemoryInner {
    entries: DashMap<String, StoredEntry>,
    lists: DashMap<String, VecDeque<String>>,
}

/// Store backend keeping everything in process memory.
///
/// Only suitable when a single server process runs; the shared-store contract
/// is otherwise identical to the networked backends, which is what makes it
/// usable for tests.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<MemoryInner>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn get_live(&self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.inner.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            self.inner.entries.remove(key);
        }
        None
    }
}

impl KeyValueStore for MemoryKvStore {
    fn generate_key(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn put(
        &self,
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let entry = StoredEntry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            };
            store.inner.entries.insert(key, entry);
            Ok(())
        })
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.get_live(&key)) })
    }

    fn exists(&self, key: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.get_live(&key).is_some()) })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.entries.remove(&key);
            Ok(())
        })
    }

    fn list_len(&self, name: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .lists
                .get(&name)
                .map(|list| list.len())
                .unwrap_or(0))
        })
    }

    fn list_push_back(
        &self,
        name: String,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.lists.entry(name).or_default().push_back(value);
            Ok(())
        })
    }

    fn list_pop_front(&self, name: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .lists
                .get_mut(&name)
                .and_then(|mut list| list.pop_front()))
        })
    }

    fn list_snapshot(&self, name: String) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .lists
                .get(&name)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn list_remove(&self, name: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(mut list) = store.inner.lists.get_mut(&name) {
                list.retain(|item| item != &value);
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_round_trip() {
        let store = MemoryKvStore::new();
        store
            .put("match/1".into(), b"payload".to_vec(), None)
            .await
            .unwrap();
        assert_eq!(
            store.get("match/1".into()).await.unwrap(),
            Some(b"payload".to_vec())
        );
        assert!(store.exists("match/1".into()).await.unwrap());
        store.delete("match/1".into()).await.unwrap();
        assert_eq!(store.get("match/1".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = MemoryKvStore::new();
        store
            .put(
                "session/1".into(),
                vec![1],
                Some(Duration::from_millis(10)),
            )
            .await
            .unwrap();
        assert!(store.exists("session/1".into()).await.unwrap());
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(!store.exists("session/1".into()).await.unwrap());
        assert_eq!(store.get("session/1".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lists_are_fifo() {
        let store = MemoryKvStore::new();
        store
            .list_push_back("queue".into(), "first".into())
            .await
            .unwrap();
        store
            .list_push_back("queue".into(), "second".into())
            .await
            .unwrap();
        assert_eq!(store.list_len("queue".into()).await.unwrap(), 2);
        assert_eq!(
            store.list_snapshot("queue".into()).await.unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
        assert_eq!(
            store.list_pop_front("queue".into()).await.unwrap(),
            Some("first".into())
        );
        assert_eq!(
            store.list_pop_front("queue".into()).await.unwrap(),
            Some("second".into())
        );
        assert_eq!(store.list_pop_front("queue".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_remove_drops_all_occurrences() {
        let store = MemoryKvStore::new();
        for value in ["a", "b", "a"] {
            store
                .list_push_back("queue".into(), value.into())
                .await
                .unwrap();
        }
        store.list_remove("queue".into(), "a".into()).await.unwrap();
        assert_eq!(
            store.list_snapshot("queue".into()).await.unwrap(),
            vec!["b".to_string()]
        );
    }
}
