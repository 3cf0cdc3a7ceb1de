use crate::migration::MigrationRecord;
use crate::schema::CollectionSchema;
use crate::store::{LedgerStore, SchemaStore, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// In-process schema and ledger storage
///
/// Useful for embedding and tests. All state lives behind mutexes so a single
/// store can be shared by reference between the schema and ledger roles.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, CollectionSchema>>,
    ledger: Mutex<BTreeMap<i64, MigrationRecord>>,
    locked: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned mutex only means a panicking test; the data is still usable
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with one collection
    pub fn with_collection(schema: CollectionSchema) -> Self {
        let store = Self::new();
        lock(&store.collections).insert(schema.id.clone(), schema);
        store
    }

    /// Applied versions, ascending
    pub fn applied_versions(&self) -> Vec<i64> {
        lock(&self.ledger).keys().copied().collect()
    }

    pub fn is_locked(&self) -> bool {
        *lock(&self.locked)
    }
}

impl SchemaStore for MemoryStore {
    fn load(&self, collection_id: &str) -> Result<CollectionSchema, StoreError> {
        lock(&self.collections)
            .get(collection_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(collection_id.to_string()))
    }

    fn save(&self, schema: &CollectionSchema) -> Result<(), StoreError> {
        lock(&self.collections).insert(schema.id.clone(), schema.clone());
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn load_applied(&self) -> Result<Vec<MigrationRecord>, StoreError> {
        Ok(lock(&self.ledger).values().cloned().collect())
    }

    fn record_applied(&self, record: &MigrationRecord) -> Result<(), StoreError> {
        let mut ledger = lock(&self.ledger);
        if ledger.contains_key(&record.version) {
            return Err(StoreError::Conflict(format!(
                "version {} is already recorded as applied",
                record.version
            )));
        }
        ledger.insert(record.version, record.clone());
        Ok(())
    }

    fn record_reverted(&self, version: i64) -> Result<(), StoreError> {
        lock(&self.ledger).remove(&version);
        Ok(())
    }

    fn try_lock(&self) -> Result<bool, StoreError> {
        let mut locked = lock(&self.locked);
        if *locked {
            return Ok(false);
        }
        *locked = true;
        Ok(true)
    }

    fn unlock(&self) -> Result<(), StoreError> {
        *lock(&self.locked) = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_load_missing_collection() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_ledger_round_trip() {
        let store = MemoryStore::new();
        let record = MigrationRecord::new(1742024609, "updated_tasks".to_string(), None, Utc::now(), Some(3));

        store.record_applied(&record).unwrap();
        assert!(matches!(store.record_applied(&record), Err(StoreError::Conflict(_))));
        assert_eq!(store.applied_versions(), vec![1742024609]);

        store.record_reverted(1742024609).unwrap();
        assert!(store.load_applied().unwrap().is_empty());
    }

    #[test]
    fn test_lock_is_exclusive() {
        let store = MemoryStore::new();
        assert!(store.try_lock().unwrap());
        assert!(!store.try_lock().unwrap());
        store.unlock().unwrap();
        assert!(store.try_lock().unwrap());
    }
}
