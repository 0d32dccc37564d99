//! Shared application state and the runtime entities.
//!
//! Matches and sessions held in a request are snapshots of what the store
//! returned; nothing in [`AppState`] caches entity state across requests.

/// Match entity and state machine.
pub mod match_state;
/// Session entity.
pub mod session;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{Repositories, kv_store::KeyValueStore},
    error::ServiceError,
};

/// Cheap-to-clone handle on the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the installed store backend and configuration.
pub struct AppState {
    kv: RwLock<Option<Arc<dyn KeyValueStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            kv: RwLock::new(None),
            degraded: degraded_tx,
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn kv_store(&self) -> Option<Arc<dyn KeyValueStore>> {
        let guard = self.kv.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with the degraded-mode error.
    pub async fn require_kv_store(&self) -> Result<Arc<dyn KeyValueStore>, ServiceError> {
        self.kv_store().await.ok_or(ServiceError::Degraded)
    }

    /// Build the repository bundle over the currently installed store.
    pub async fn require_repositories(&self) -> Result<Repositories, ServiceError> {
        let kv = self.require_kv_store().await?;
        Ok(Repositories::new(
            kv,
            self.config.session_ttl,
            self.config.match_ttl,
        ))
    }

    /// Install a store backend and leave degraded mode.
    pub async fn install_kv_store(&self, store: Arc<dyn KeyValueStore>) {
        {
            let mut guard = self.kv.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_kv_store(&self) {
        {
            let mut guard = self.kv.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}
