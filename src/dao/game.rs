//! Repository persisting matches and the shared waiting queue.

use std::{sync::Arc, time::Duration};

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        kv_store::KeyValueStore,
        models::MatchRecord,
        storage::{StorageError, StorageResult},
    },
    state::match_state::Match,
};

/// Store list holding the ids of matches awaiting a second participant.
const WAITING_LIST: &str = "matches/waiting";

fn match_key(id: Uuid) -> String {
    format!("match/{id}")
}

/// Data access object for [`Match`] entities and the waiting queue.
#[derive(Clone)]
pub struct MatchRepository {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl MatchRepository {
    /// Build a repository over the given store handle.
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Mint a fresh globally unique match id.
    pub fn generate_id(&self) -> Uuid {
        self.kv.generate_key()
    }

    /// Persist the match, refreshing its expiry window.
    pub async fn save(&self, game: &Match) -> StorageResult<()> {
        let key = match_key(game.id());
        let record = MatchRecord::from(game.clone());
        let bytes = serde_json::to_vec(&record).map_err(|source| StorageError::Encoding {
            key: key.clone(),
            source,
        })?;
        self.kv.put(key, bytes, Some(self.ttl)).await
    }

    /// Load a match by id. An unreadable payload counts as absent.
    pub async fn find(&self, id: Uuid) -> StorageResult<Option<Match>> {
        let key = match_key(id);
        let Some(bytes) = self.kv.get(key.clone()).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<MatchRecord>(&bytes) {
            Ok(record) => Ok(Some(record.into())),
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable match record");
                Ok(None)
            }
        }
    }

    /// Drop the persisted match entirely.
    pub async fn delete(&self, id: Uuid) -> StorageResult<()> {
        self.kv.delete(match_key(id)).await
    }

    /// Append a match id to the tail of the waiting queue.
    pub async fn enqueue_waiting(&self, id: Uuid) -> StorageResult<()> {
        self.kv
            .list_push_back(WAITING_LIST.into(), id.to_string())
            .await
    }

    /// Pop the oldest waiting match id, skipping entries that do not parse.
    pub async fn pop_waiting(&self) -> StorageResult<Option<Uuid>> {
        loop {
            let Some(raw) = self.kv.list_pop_front(WAITING_LIST.into()).await? else {
                return Ok(None);
            };
            match Uuid::parse_str(&raw) {
                Ok(id) => return Ok(Some(id)),
                Err(_) => {
                    warn!(entry = %raw, "dropping malformed waiting-queue entry");
                }
            }
        }
    }

    /// Copy of the waiting queue, oldest first, raw entries included.
    pub async fn waiting_snapshot(&self) -> StorageResult<Vec<String>> {
        self.kv.list_snapshot(WAITING_LIST.into()).await
    }

    /// Number of matches currently waiting for a second participant.
    pub async fn waiting_len(&self) -> StorageResult<usize> {
        self.kv.list_len(WAITING_LIST.into()).await
    }

    /// Remove a raw entry from the waiting queue.
    pub async fn remove_waiting_raw(&self, raw: &str) -> StorageResult<()> {
        self.kv
            .list_remove(WAITING_LIST.into(), raw.to_owned())
            .await
    }

    /// Remove a match id from the waiting queue.
    pub async fn remove_waiting(&self, id: Uuid) -> StorageResult<()> {
        self.remove_waiting_raw(&id.to_string()).await
    }
}
