//! Migration-specific error types

use crate::migration::MigrationDirection;
use crate::schema::SchemaError;
use crate::store::StoreError;
use thiserror::Error;

/// Migration-specific errors
///
/// Every failure during a pass carries the version it happened on. `completed`
/// lists the versions that were committed in the same pass before the failure;
/// those stay applied.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Two migrations share a version
    #[error("migration '{name}' (version {version}) conflicts with an already registered migration")]
    DuplicateVersion { version: i64, name: String },

    /// The collection could not be read from storage
    ///
    /// `version` is the step that needed the collection, `None` when the
    /// failure happened before the first step.
    #[error("failed to load collection '{collection}'{}: {source}", step_suffix(.version))]
    SchemaLoad {
        collection: String,
        version: Option<i64>,
        completed: Vec<i64>,
        #[source]
        source: StoreError,
    },

    /// The applied-version ledger could not be read
    #[error("failed to load the migration ledger: {0}")]
    LedgerLoad(#[source] StoreError),

    /// A field edit failed while running `up()` or `down()`
    #[error("migration '{name}' (version {version}) failed during {direction}: {source}")]
    Apply {
        version: i64,
        name: String,
        direction: MigrationDirection,
        completed: Vec<i64>,
        #[source]
        source: SchemaError,
    },

    /// Writing the new schema or the ledger entry failed
    #[error("failed to persist migration {version} ({direction}): {source}")]
    Persist {
        version: i64,
        direction: MigrationDirection,
        completed: Vec<i64>,
        #[source]
        source: StoreError,
    },

    /// The ledger write failed and putting the previous schema back failed too
    ///
    /// The stored collection reflects the migration but the ledger does not.
    #[error(
        "failed to record migration {version} ({direction}): {ledger}.\n\
         Restoring the previous schema also failed: {source}.\n\
         The collection must be repaired by hand before the next run"
    )]
    Restore {
        version: i64,
        direction: MigrationDirection,
        completed: Vec<i64>,
        ledger: StoreError,
        #[source]
        source: StoreError,
    },

    /// Another runner holds the migration lock
    #[error(
        "another migration runner is active (lock: {0}).\n\
         If no other process is running, release the stale lock"
    )]
    RunnerBusy(String),

    /// An applied version has no registered migration
    #[error(
        "applied migration {version} is not registered.\n\
         Suggestion: ensure all migration files are present in the migrations directory"
    )]
    MissingMigration { version: i64 },

    /// A migration script changed after it was applied
    #[error(
        "migration '{name}' (version {version}) has been modified after being applied.\n\
         Stored checksum: {stored}\n\
         Current checksum: {current}"
    )]
    ChecksumMismatch {
        version: i64,
        name: String,
        stored: String,
        current: String,
    },

    /// Migrations directory missing or unreadable
    #[error("migration file not found: {0}")]
    FileNotFound(String),

    /// A migration file name or script body is malformed
    #[error("invalid migration format: {0}")]
    InvalidFormat(String),
}

fn step_suffix(version: &Option<i64>) -> String {
    version.map(|v| format!(" for migration {v}")).unwrap_or_default()
}

impl MigrationError {
    /// The version the error is attached to, if any
    pub fn version(&self) -> Option<i64> {
        match self {
            MigrationError::DuplicateVersion { version, .. }
            | MigrationError::Apply { version, .. }
            | MigrationError::Persist { version, .. }
            | MigrationError::Restore { version, .. }
            | MigrationError::MissingMigration { version }
            | MigrationError::ChecksumMismatch { version, .. } => Some(*version),
            MigrationError::SchemaLoad { version, .. } => *version,
            _ => None,
        }
    }

    /// Versions committed in the failing pass before the error occurred
    pub fn completed(&self) -> &[i64] {
        match self {
            MigrationError::SchemaLoad { completed, .. }
            | MigrationError::Apply { completed, .. }
            | MigrationError::Persist { completed, .. }
            | MigrationError::Restore { completed, .. } => completed,
            _ => &[],
        }
    }
}
