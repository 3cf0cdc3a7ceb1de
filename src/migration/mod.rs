//! Migration system for Schemaward
//!
//! This module provides the infrastructure for collection migrations, including:
//! - Migration trait definition and the closure/script based implementations
//! - SchemaManager for field edits
//! - Migration registry, ledger records and status
//! - Migration execution with locking
//!
//! # Example
//!
//! ```rust
//! use schemaward::migration::{Migration, SchemaManager};
//! use schemaward::schema::{Field, SchemaError};
//!
//! pub struct AddPriority;
//!
//! impl Migration for AddPriority {
//!     fn name(&self) -> &str {
//!         "add_priority"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         1742024609
//!     }
//!
//!     fn up(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
//!         let field = Field::select("select1655102503", "priority", ["low", "medium", "high"], 1);
//!         manager.add_field(4, field)
//!     }
//!
//!     fn down(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
//!         manager.remove_field("select1655102503")
//!     }
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod file;
pub mod lock;
#[allow(clippy::module_inception)]
pub mod migration;
pub mod migrator;
pub mod record;
pub mod registry;
pub mod schema_manager;
pub mod script;
pub mod startup;
pub mod status;

pub use checksum::calculate_checksum;
pub use error::MigrationError;
pub use file::{discover_migrations, load_registry, MigrationFile};
pub use lock::MigrationLockGuard;
pub use migration::{FnMigration, Migration, MigrationDirection, MigrationFn};
pub use migrator::{MigrationReport, Migrator, RunnerState};
pub use record::MigrationRecord;
pub use registry::MigrationRegistry;
pub use schema_manager::SchemaManager;
pub use script::{FieldEdit, ScriptedMigration};
pub use startup::startup_migrations;
pub use status::{MigrationStatus, PendingMigration};
