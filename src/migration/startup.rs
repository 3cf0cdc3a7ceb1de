//! In-process migration execution helpers

use crate::config::MigrateConfig;
use crate::migration::{load_registry, MigrationError, MigrationReport, Migrator};
use crate::store::JsonFileStore;

/// Run migrations on application startup
///
/// Loads every script from `config.migrations_dir`, opens the JSON store in
/// `config.data_dir` and applies all pending migrations to
/// `config.collection`.
///
/// # Behavior
///
/// - **First process wins:** a second process started concurrently fails
///   with `MigrationError::RunnerBusy` instead of waiting
/// - **Fail-fast:** if a migration fails the error names its version and the
///   application should not start
///
/// # Example
///
/// ```rust,no_run
/// use schemaward::{MigrateConfig, migration::startup_migrations};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = MigrateConfig::load()?;
///     startup_migrations(&config)?;
///     // Continue with application startup...
///     Ok(())
/// }
/// ```
pub fn startup_migrations(config: &MigrateConfig) -> Result<MigrationReport, MigrationError> {
    let registry = load_registry(&config.migrations_dir)?;
    let store = JsonFileStore::open(&config.data_dir).map_err(|source| MigrationError::SchemaLoad {
        collection: config.collection.clone(),
        version: None,
        completed: Vec::new(),
        source,
    })?;

    let migrator = Migrator::new(registry, config.collection.clone());
    let report = migrator.up(&store, &store, None)?;

    if report.count() > 0 {
        log::info!("Applied {} migration(s) on startup", report.count());
    } else {
        log::debug!("No pending migrations to apply");
    }

    Ok(report)
}
