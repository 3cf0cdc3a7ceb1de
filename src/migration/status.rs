//! Migration status tracking

use crate::migration::MigrationRecord;

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Applied migrations (from the ledger)
    pub applied: Vec<MigrationRecord>,

    /// Pending migrations (from the registry), ascending
    pub pending: Vec<PendingMigration>,

    /// Total number of migrations (applied + pending)
    pub total: usize,

    /// Number of applied migrations
    pub applied_count: usize,

    /// Number of pending migrations
    pub pending_count: usize,
}

/// Represents a pending migration (not yet applied)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
    pub version: i64,

    pub name: String,

    /// `true` when the version is older than the newest applied one.
    /// Such gaps are never applied by `up()`, which only moves forward.
    pub out_of_order: bool,
}

impl MigrationStatus {
    /// Create a new `MigrationStatus`
    #[must_use]
    pub fn new(applied: Vec<MigrationRecord>, pending: Vec<PendingMigration>) -> Self {
        let applied_count = applied.len();
        let pending_count = pending.len();
        let total = applied_count + pending_count;

        Self {
            applied,
            pending,
            total,
            applied_count,
            pending_count,
        }
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count == 0
    }

    /// Get the latest applied migration version
    #[must_use]
    pub fn latest_applied_version(&self) -> Option<i64> {
        self.applied.iter().map(|m| m.version).max()
    }

    /// Get the next pending migration version that `up()` would apply
    #[must_use]
    pub fn next_pending_version(&self) -> Option<i64> {
        self.pending.iter().find(|m| !m.out_of_order).map(|m| m.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pending(version: i64, out_of_order: bool) -> PendingMigration {
        PendingMigration {
            version,
            name: format!("m{version}"),
            out_of_order,
        }
    }

    #[test]
    fn test_counts_and_latest() {
        let applied = vec![
            MigrationRecord::new(100, "a".to_string(), None, Utc::now(), None),
            MigrationRecord::new(300, "c".to_string(), None, Utc::now(), None),
        ];
        let status = MigrationStatus::new(applied, vec![pending(200, true), pending(400, false)]);

        assert_eq!(status.total, 4);
        assert_eq!(status.applied_count, 2);
        assert_eq!(status.latest_applied_version(), Some(300));
        assert!(!status.is_up_to_date());
        // 200 is older than 300 and will be skipped by up()
        assert_eq!(status.next_pending_version(), Some(400));
    }

    #[test]
    fn test_empty_status_is_up_to_date() {
        let status = MigrationStatus::new(Vec::new(), Vec::new());
        assert!(status.is_up_to_date());
        assert_eq!(status.latest_applied_version(), None);
        assert_eq!(status.next_pending_version(), None);
    }
}
