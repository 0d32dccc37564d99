//! MongoDB-backed implementation of the key-value store adapter.

mod connection;
mod error;
pub mod store;

pub use error::MongoDaoError;
pub use store::{MongoConfig, MongoKvStore};

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
