//! The MongoDB rendition of the store adapter: one collection of TTL-indexed
//! binary entries, one collection of list documents.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use futures::future::BoxFuture;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Binary, DateTime, doc, spec::BinarySubtype},
    options::{ClientOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{kv_store::KeyValueStore, storage::StorageResult};

const ENTRY_COLLECTION_NAME: &str = "kv_entries";
const LIST_COLLECTION_NAME: &str = "kv_lists";

/// Connection parameters for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed driver options.
    pub options: ClientOptions,
    /// Name of the database holding the two adapter collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection string, defaulting the database name when absent.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("grid_duel").to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}

/// Keyed blob entry persisted in [`ENTRY_COLLECTION_NAME`].
#[derive(Debug, Serialize, Deserialize)]
struct KvEntryDocument {
    #[serde(rename = "_id")]
    key: String,
    value: Binary,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime>,
}

/// Named FIFO list persisted in [`LIST_COLLECTION_NAME`].
#[derive(Debug, Serialize, Deserialize)]
struct KvListDocument {
    #[serde(rename = "_id")]
    name: String,
    #[serde(default)]
    items: Vec<String>,
}

struct MongoState {
    client: Client,
    database: Database,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

impl MongoInner {
    async fn database(&self) -> Database {
        let guard = self.state.read().await;
        guard.database.clone()
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.client.database(&self.config.database_name)
        };
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Store adapter backed by MongoDB.
#[derive(Clone)]
pub struct MongoKvStore {
    inner: Arc<MongoInner>,
}

impl MongoKvStore {
    /// Establish a connection and ensure the expiry index is present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the TTL index letting MongoDB reclaim expired entries on its own.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.inner.database().await;
        let collection = database.collection::<KvEntryDocument>(ENTRY_COLLECTION_NAME);
        let index = IndexModel::builder()
            .keys(doc! {"expires_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("entry_expiry_idx".to_owned()))
                    .expire_after(Some(Duration::from_secs(0)))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ENTRY_COLLECTION_NAME,
                source,
            })?;

        Ok(())
    }

    async fn entries(&self) -> Collection<KvEntryDocument> {
        self.inner
            .database()
            .await
            .collection::<KvEntryDocument>(ENTRY_COLLECTION_NAME)
    }

    async fn lists(&self) -> Collection<KvListDocument> {
        self.inner
            .database()
            .await
            .collection::<KvListDocument>(LIST_COLLECTION_NAME)
    }

    async fn put_entry(
        &self,
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> MongoResult<()> {
        let document = KvEntryDocument {
            key: key.clone(),
            value: Binary {
                subtype: BinarySubtype::Generic,
                bytes: value,
            },
            expires_at: ttl.map(|ttl| DateTime::from_system_time(SystemTime::now() + ttl)),
        };

        self.entries()
            .await
            .replace_one(doc! {"_id": &key}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::WriteEntry { key, source })?;

        Ok(())
    }

    async fn get_entry(&self, key: String) -> MongoResult<Option<Vec<u8>>> {
        let document = self
            .entries()
            .await
            .find_one(doc! {"_id": &key})
            .await
            .map_err(|source| MongoDaoError::ReadEntry { key, source })?;

        // The TTL monitor only runs periodically, so an expired entry can
        // still be present; treat it as absent.
        let live = document.filter(|entry| {
            entry
                .expires_at
                .is_none_or(|at| at.to_system_time() > SystemTime::now())
        });

        Ok(live.map(|entry| entry.value.bytes))
    }

    async fn delete_entry(&self, key: String) -> MongoResult<()> {
        self.entries()
            .await
            .delete_one(doc! {"_id": &key})
            .await
            .map_err(|source| MongoDaoError::DeleteEntry { key, source })?;
        Ok(())
    }

    async fn read_list(&self, name: String) -> MongoResult<Vec<String>> {
        let document = self
            .lists()
            .await
            .find_one(doc! {"_id": &name})
            .await
            .map_err(|source| MongoDaoError::ReadList { name, source })?;
        Ok(document.map(|list| list.items).unwrap_or_default())
    }

    async fn push_back(&self, name: String, value: String) -> MongoResult<()> {
        self.lists()
            .await
            .update_one(doc! {"_id": &name}, doc! {"$push": {"items": value}})
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::UpdateList { name, source })?;
        Ok(())
    }

    async fn pop_front(&self, name: String) -> MongoResult<Option<String>> {
        // `$pop: -1` with the pre-image returned makes the pop atomic.
        let before = self
            .lists()
            .await
            .find_one_and_update(doc! {"_id": &name}, doc! {"$pop": {"items": -1}})
            .return_document(ReturnDocument::Before)
            .await
            .map_err(|source| MongoDaoError::UpdateList { name, source })?;

        Ok(before.and_then(|list| list.items.into_iter().next()))
    }

    async fn remove_value(&self, name: String, value: String) -> MongoResult<()> {
        self.lists()
            .await
            .update_one(doc! {"_id": &name}, doc! {"$pull": {"items": value}})
            .await
            .map_err(|source| MongoDaoError::UpdateList { name, source })?;
        Ok(())
    }
}

impl KeyValueStore for MongoKvStore {
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
        Box::pin(async move { store.put_entry(key, value, ttl).await.map_err(Into::into) })
    }

    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let store = self.clone();
        Box::pin(async move { store.get_entry(key).await.map_err(Into::into) })
    }

    fn exists(&self, key: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let entry = store.get_entry(key).await?;
            Ok(entry.is_some())
        })
    }

    fn delete(&self, key: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_entry(key).await.map_err(Into::into) })
    }

    fn list_len(&self, name: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let items = store.read_list(name).await?;
            Ok(items.len())
        })
    }

    fn list_push_back(
        &self,
        name: String,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.push_back(name, value).await.map_err(Into::into) })
    }

    fn list_pop_front(&self, name: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move { store.pop_front(name).await.map_err(Into::into) })
    }

    fn list_snapshot(&self, name: String) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move { store.read_list(name).await.map_err(Into::into) })
    }

    fn list_remove(&self, name: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.remove_value(name, value).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
