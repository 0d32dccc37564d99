//! Persistence layer: the store adapter, flat records, and repositories.

/// Match persistence and waiting-queue operations.
pub mod game;
/// Key-value store adapter trait and its backends.
pub mod kv_store;
/// Serializable record definitions.
pub mod models;
/// Session persistence operations.
pub mod session;
/// Storage abstraction errors.
pub mod storage;

use std::{sync::Arc, time::Duration};

use self::{game::MatchRepository, kv_store::KeyValueStore, session::SessionRepository};

/// Bundle of the repositories a request needs, built over one store handle.
#[derive(Clone)]
pub struct Repositories {
    /// Session data access.
    pub sessions: SessionRepository,
    /// Match and waiting-queue data access.
    pub matches: MatchRepository,
}

impl Repositories {
    /// Build both repositories over the same store handle.
    pub fn new(kv: Arc<dyn KeyValueStore>, session_ttl: Duration, match_ttl: Duration) -> Self {
        Self {
            sessions: SessionRepository::new(kv.clone(), session_ttl),
            matches: MatchRepository::new(kv, match_ttl),
        }
    }
}
