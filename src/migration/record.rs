//! `MigrationRecord` - one entry of the applied-version ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an applied migration in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration version (unix timestamp)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,

    /// `SHA-256` checksum of the migration script, for file-backed migrations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// When the migration was applied
    pub applied_at: DateTime<Utc>,

    /// Execution time in milliseconds (`None` if not recorded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<i64>,
}

impl MigrationRecord {
    /// Create a new `MigrationRecord`
    #[must_use]
    pub fn new(
        version: i64,
        name: String,
        checksum: Option<String>,
        applied_at: DateTime<Utc>,
        execution_time_ms: Option<i64>,
    ) -> Self {
        Self {
            version,
            name,
            checksum,
            applied_at,
            execution_time_ms,
        }
    }
}
