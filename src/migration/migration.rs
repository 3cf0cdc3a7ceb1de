//! Migration trait definition

use super::schema_manager::SchemaManager;
use crate::schema::SchemaError;
use std::fmt;

/// Trait that all migrations must implement
///
/// A migration is one reversible delta of a collection's field set. `up()`
/// and `down()` are expected to be exact inverses for every field they touch.
/// The migrator does not verify this; a pair that is not invertible will
/// leave the collection in a different state after an up/down round trip.
pub trait Migration: Send + Sync {
    /// Get the migration name (human-readable identifier)
    fn name(&self) -> &str;

    /// Get the migration version (unix timestamp of authoring)
    fn version(&self) -> i64;

    /// Apply the migration (forward migration)
    fn up(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError>;

    /// Rollback the migration (reverse migration)
    fn down(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError>;

    /// SHA-256 of the migration source, when it comes from a file
    fn checksum(&self) -> Option<&str> {
        None
    }
}

/// Direction for migration execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (up)
    Up,
    /// Rollback the migration (down)
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => f.write_str("up"),
            MigrationDirection::Down => f.write_str("down"),
        }
    }
}

/// Edit function used by [`FnMigration`]
pub type MigrationFn = Box<dyn Fn(&mut SchemaManager<'_>) -> Result<(), SchemaError> + Send + Sync>;

/// A migration built from a pair of closures
pub struct FnMigration {
    version: i64,
    name: String,
    up: MigrationFn,
    down: MigrationFn,
}

impl FnMigration {
    pub fn new<U, D>(version: i64, name: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(&mut SchemaManager<'_>) -> Result<(), SchemaError> + Send + Sync + 'static,
        D: Fn(&mut SchemaManager<'_>) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        Self {
            version,
            name: name.into(),
            up: Box::new(up),
            down: Box::new(down),
        }
    }
}

impl fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Migration for FnMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn up(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
        (self.up)(manager)
    }

    fn down(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
        (self.down)(manager)
    }
}
