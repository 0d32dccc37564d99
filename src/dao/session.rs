//! Repository persisting sessions through the store adapter.

use std::{sync::Arc, time::Duration};

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        kv_store::KeyValueStore,
        models::SessionRecord,
        storage::{StorageError, StorageResult},
    },
    state::session::Session,
};

fn session_key(id: Uuid) -> String {
    format!("session/{id}")
}

/// Data access object for [`Session`] entities.
///
/// Sessions are written with the inactivity window as TTL, so a session the
/// store no longer knows is by definition one that has been unseen too long.
#[derive(Clone)]
pub struct SessionRepository {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionRepository {
    /// Build a repository over the given store handle.
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Mint a fresh globally unique session id.
    pub fn generate_id(&self) -> Uuid {
        self.kv.generate_key()
    }

    /// Persist the session, refreshing its expiry window.
    pub async fn save(&self, session: &Session) -> StorageResult<()> {
        let key = session_key(session.id());
        let record = SessionRecord::from(session.clone());
        let bytes = serde_json::to_vec(&record).map_err(|source| StorageError::Encoding {
            key: key.clone(),
            source,
        })?;
        self.kv.put(key, bytes, Some(self.ttl)).await
    }

    /// Load a session by id. An unreadable payload counts as absent so the
    /// caller starts fresh instead of failing the request.
    pub async fn find(&self, id: Uuid) -> StorageResult<Option<Session>> {
        let key = session_key(id);
        let Some(bytes) = self.kv.get(key.clone()).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<SessionRecord>(&bytes) {
            Ok(record) => Ok(Some(record.into())),
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable session record");
                Ok(None)
            }
        }
    }

    /// Whether the store still holds a live entry for this session.
    pub async fn exists(&self, id: Uuid) -> StorageResult<bool> {
        self.kv.exists(session_key(id)).await
    }
}
