//! # Schemaward
//!
//! Versioned, reversible field migrations for a hosted collection schema.
//!
//! A [`migration::Migrator`] replays an ordered [`migration::MigrationRegistry`]
//! against a [`schema::CollectionSchema`] loaded from a [`store::SchemaStore`],
//! recording every applied version in a [`store::LedgerStore`].
//!
//! ```rust,no_run
//! use schemaward::migration::{load_registry, Migrator};
//! use schemaward::store::JsonFileStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = load_registry("./migrations")?;
//!     let store = JsonFileStore::open("./pb_data")?;
//!     let migrator = Migrator::new(registry, "pbc_3577811883");
//!
//!     let report = migrator.up(&store, &store, None)?;
//!     println!("applied {} migration(s)", report.count());
//!     Ok(())
//! }
//! ```

pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod migration;
pub mod schema;
pub mod store;

pub use config::MigrateConfig;
pub use migration::{Migration, MigrationError, Migrator};
pub use schema::{CollectionSchema, Field, FieldType, SchemaError};
