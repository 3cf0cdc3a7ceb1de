//! Migration registry

use crate::migration::{FnMigration, Migration, MigrationError, SchemaManager};
use crate::schema::SchemaError;
use std::fmt;

/// An ordered set of migrations, indexed by version
///
/// The registry is built explicitly by the caller, either from a list of
/// migrations, one `register()` call at a time, or from a directory of
/// scripts through [`crate::migration::load_registry`]. Versions are the only
/// ordering and identity key, so duplicates are rejected on registration.
#[derive(Default)]
pub struct MigrationRegistry {
    /// Sorted ascending by version
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    /// Build a registry from a list of migrations in any order
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateVersion` if two migrations share a version.
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> Result<Self, MigrationError> {
        let mut registry = Self::default();
        for migration in migrations {
            registry.register(migration)?;
        }
        Ok(registry)
    }

    /// Register a migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateVersion` if a migration with the same
    /// version is already registered.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> Result<(), MigrationError> {
        let version = migration.version();
        match self.migrations.binary_search_by_key(&version, |m| m.version()) {
            Ok(_) => Err(MigrationError::DuplicateVersion {
                version,
                name: migration.name().to_string(),
            }),
            Err(pos) => {
                self.migrations.insert(pos, migration);
                Ok(())
            }
        }
    }

    /// Register a migration from an apply/revert closure pair
    pub fn register_fn<U, D>(&mut self, version: i64, name: impl Into<String>, up: U, down: D) -> Result<(), MigrationError>
    where
        U: Fn(&mut SchemaManager<'_>) -> Result<(), SchemaError> + Send + Sync + 'static,
        D: Fn(&mut SchemaManager<'_>) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        self.register(Box::new(FnMigration::new(version, name, up, down)))
    }

    /// All migrations, ascending by version
    ///
    /// Each call starts a fresh pass over the registry.
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &dyn Migration> + '_ {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Get a migration by version
    pub fn get(&self, version: i64) -> Option<&dyn Migration> {
        self.migrations
            .binary_search_by_key(&version, |m| m.version())
            .ok()
            .map(|pos| self.migrations[pos].as_ref())
    }

    pub fn contains(&self, version: i64) -> bool {
        self.get(version).is_some()
    }

    /// Registered versions, ascending
    pub fn versions(&self) -> Vec<i64> {
        self.migrations.iter().map(|m| m.version()).collect()
    }

    pub fn latest_version(&self) -> Option<i64> {
        self.migrations.last().map(|m| m.version())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.migrations.iter().map(|m| (m.version(), m.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(version: i64, name: &str) -> Box<dyn Migration> {
        Box::new(FnMigration::new(version, name, |_| Ok(()), |_| Ok(())))
    }

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_new_sorts_by_version() {
        let registry = MigrationRegistry::new(vec![
            noop(1742036235, "d"),
            noop(1741976865, "a"),
            noop(1742024685, "c"),
            noop(1742024609, "b"),
        ])
        .expect("Should build registry");

        assert_eq!(registry.versions(), vec![1741976865, 1742024609, 1742024685, 1742036235]);
        assert_eq!(registry.latest_version(), Some(1742036235));
        let names: Vec<&str> = registry.all().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_register_duplicate_returns_duplicate_version() {
        let mut registry = MigrationRegistry::default();
        registry.register(noop(20, "first_migration")).unwrap();

        match registry.register(noop(20, "second_migration")).unwrap_err() {
            MigrationError::DuplicateVersion { version, name } => {
                assert_eq!(version, 20, "Error should contain correct version");
                assert_eq!(name, "second_migration", "Error should contain the rejected name");
            }
            other => panic!("Expected DuplicateVersion, got {other:?}"),
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(20).map(|m| m.name()), Some("first_migration"));
    }

    #[test]
    fn test_all_is_restartable() {
        let mut registry = MigrationRegistry::default();
        registry.register_fn(2, "two", |_| Ok(()), |_| Ok(())).unwrap();
        registry.register_fn(1, "one", |_| Ok(()), |_| Ok(())).unwrap();

        let first: Vec<i64> = registry.all().map(|m| m.version()).collect();
        let second: Vec<i64> = registry.all().map(|m| m.version()).collect();
        assert_eq!(first, second);
        let reversed: Vec<i64> = registry.all().rev().map(|m| m.version()).collect();
        assert_eq!(reversed, vec![2, 1]);
    }

    #[test]
    fn test_get_unknown_version() {
        let registry = MigrationRegistry::new(vec![noop(1, "one")]).unwrap();
        assert!(registry.get(2).is_none());
        assert!(!registry.contains(2));
        assert!(registry.contains(1));
    }
}
