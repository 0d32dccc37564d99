use thiserror::Error;

/// Result alias for MongoDB adapter operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB store backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// Offending connection string.
        uri: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The client could not be constructed from the parsed options.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The server never answered the initial ping.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        /// Number of ping attempts performed.
        attempts: u32,
        /// Last driver error observed.
        #[source]
        source: mongodb::error::Error,
    },
    /// A health-check ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// An index could not be created.
    #[error("failed to ensure index on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A keyed entry could not be written.
    #[error("failed to write entry `{key}`")]
    WriteEntry {
        /// Store key of the entry.
        key: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A keyed entry could not be read.
    #[error("failed to read entry `{key}`")]
    ReadEntry {
        /// Store key of the entry.
        key: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A keyed entry could not be deleted.
    #[error("failed to delete entry `{key}`")]
    DeleteEntry {
        /// Store key of the entry.
        key: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A list document could not be read.
    #[error("failed to read list `{name}`")]
    ReadList {
        /// List name.
        name: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A list document could not be updated.
    #[error("failed to update list `{name}`")]
    UpdateList {
        /// List name.
        name: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
}
