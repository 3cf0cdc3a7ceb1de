//! Storage collaborators used by the migrator
//!
//! [`SchemaStore`] holds the live collection definitions and [`LedgerStore`]
//! holds the record of applied migration versions plus the advisory lock
//! that keeps two runners from interleaving.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::migration::MigrationRecord;
use crate::schema::CollectionSchema;
use thiserror::Error;

/// Errors returned by storage collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested collection does not exist
    #[error("collection '{0}' not found")]
    NotFound(String),

    /// The collection id cannot name a stored collection
    #[error("invalid collection id '{0}'")]
    InvalidId(String),

    /// Underlying I/O failure
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be decoded
    #[error("malformed data in {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The write conflicts with existing state
    #[error("storage conflict: {0}")]
    Conflict(String),
}

/// Read and write access to collection schemas
pub trait SchemaStore {
    /// Load the current definition of a collection
    fn load(&self, collection_id: &str) -> Result<CollectionSchema, StoreError>;

    /// Persist a collection definition, replacing the stored one
    fn save(&self, schema: &CollectionSchema) -> Result<(), StoreError>;
}

/// Persistence for the applied-version ledger
pub trait LedgerStore {
    /// All applied migrations, ascending by version
    fn load_applied(&self) -> Result<Vec<MigrationRecord>, StoreError>;

    /// Add a version to the ledger
    ///
    /// Returns `StoreError::Conflict` if the version is already recorded.
    fn record_applied(&self, record: &MigrationRecord) -> Result<(), StoreError>;

    /// Remove a version from the ledger
    fn record_reverted(&self, version: i64) -> Result<(), StoreError>;

    /// Try to take the advisory runner lock
    ///
    /// Returns `Ok(false)` without waiting if another runner holds it.
    fn try_lock(&self) -> Result<bool, StoreError>;

    /// Release the advisory runner lock
    fn unlock(&self) -> Result<(), StoreError>;

    /// Where the lock lives, for operator-facing messages
    fn describe_lock(&self) -> String {
        "ledger lock".to_string()
    }
}
