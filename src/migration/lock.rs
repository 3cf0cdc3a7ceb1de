//! Ledger-backed advisory lock for migration runs

use crate::migration::MigrationError;
use crate::store::LedgerStore;

/// Lock guard that automatically releases the lock when dropped
///
/// Only one runner may hold the lock for a given ledger. Acquisition never
/// waits: a held lock fails immediately with `MigrationError::RunnerBusy`.
pub struct MigrationLockGuard<'a> {
    ledger: &'a dyn LedgerStore,
}

impl<'a> MigrationLockGuard<'a> {
    /// Acquire the migration lock and create the guard
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::RunnerBusy` if another runner holds the lock and
    /// `MigrationError::LedgerLoad` if the lock cannot be queried.
    pub fn acquire(ledger: &'a dyn LedgerStore) -> Result<Self, MigrationError> {
        if !ledger.try_lock().map_err(MigrationError::LedgerLoad)? {
            return Err(MigrationError::RunnerBusy(ledger.describe_lock()));
        }
        log::debug!("Acquired migration lock");
        Ok(Self { ledger })
    }
}

impl Drop for MigrationLockGuard<'_> {
    fn drop(&mut self) {
        // Errors can't be propagated from drop
        if let Err(e) = self.ledger.unlock() {
            log::warn!("Failed to release migration lock: {}", e);
        } else {
            log::debug!("Released migration lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_second_acquire_is_busy() {
        let store = MemoryStore::new();
        let guard = MigrationLockGuard::acquire(&store).unwrap();

        assert!(matches!(
            MigrationLockGuard::acquire(&store),
            Err(MigrationError::RunnerBusy(_))
        ));

        drop(guard);
        assert!(!store.is_locked());
        assert!(MigrationLockGuard::acquire(&store).is_ok());
    }
}
