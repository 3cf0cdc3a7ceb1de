//! Migrator - Core migration execution engine

use crate::migration::{
    Migration, MigrationDirection, MigrationError, MigrationLockGuard, MigrationRecord,
    MigrationRegistry, MigrationStatus, PendingMigration, SchemaManager,
};
use crate::schema::CollectionSchema;
use crate::store::{LedgerStore, SchemaStore};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Where the runner is in its current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Loading,
    Applying(i64),
    Persisting(i64),
    /// The last pass stopped on this version (`None` if it failed before any step)
    Failed(Option<i64>),
}

/// Outcome of a successful `up()` or `down()` pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub direction: MigrationDirection,

    /// Versions applied (or reverted) in this pass, in execution order
    pub versions: Vec<i64>,

    /// Applied versions the pass left in place
    pub unchanged: usize,

    /// Soft failures tolerated during rollback
    pub warnings: Vec<String>,
}

impl MigrationReport {
    fn empty(direction: MigrationDirection, unchanged: usize) -> Self {
        Self {
            direction,
            versions: Vec::new(),
            unchanged,
            warnings: Vec::new(),
        }
    }

    /// Number of migrations executed
    pub fn count(&self) -> usize {
        self.versions.len()
    }
}

/// Core migration execution engine
///
/// The `Migrator` replays a [`MigrationRegistry`] against one collection.
/// Migrations run one at a time in version order. Each step loads the
/// collection, runs the migration, saves the collection and then updates the
/// ledger. A pass stops at the first failure; steps committed before it stay
/// applied and are listed in [`MigrationError::completed`].
///
/// Storage is borrowed per call, so the same migrator can be pointed at
/// different stores.
#[derive(Debug)]
pub struct Migrator {
    registry: MigrationRegistry,
    collection_id: String,
    state: Mutex<RunnerState>,
}

impl Migrator {
    pub fn new(registry: MigrationRegistry, collection_id: impl Into<String>) -> Self {
        Self {
            registry,
            collection_id: collection_id.into(),
            state: Mutex::new(RunnerState::Idle),
        }
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// State of the current (or last) pass
    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunnerState) {
        log::debug!("Runner state: {:?}", state);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Get migration status (applied vs pending)
    ///
    /// Also validates the ledger against the registry: every applied version
    /// must still be registered and, where both sides carry one, its checksum
    /// must match.
    pub fn status(&self, ledger: &dyn LedgerStore) -> Result<MigrationStatus, MigrationError> {
        let applied = ledger.load_applied().map_err(MigrationError::LedgerLoad)?;

        for record in &applied {
            let migration = self.registry.get(record.version)
                .ok_or(MigrationError::MissingMigration { version: record.version })?;

            if let (Some(stored), Some(current)) = (record.checksum.as_deref(), migration.checksum()) {
                if stored != current {
                    return Err(MigrationError::ChecksumMismatch {
                        version: record.version,
                        name: migration.name().to_string(),
                        stored: stored.to_string(),
                        current: current.to_string(),
                    });
                }
            }
        }

        let applied_versions: HashSet<i64> = applied.iter().map(|r| r.version).collect();
        let latest_applied = applied_versions.iter().copied().max();

        let pending = self.registry.all()
            .filter(|m| !applied_versions.contains(&m.version()))
            .map(|m| PendingMigration {
                version: m.version(),
                name: m.name().to_string(),
                out_of_order: latest_applied.is_some_and(|latest| m.version() < latest),
            })
            .collect();

        Ok(MigrationStatus::new(applied, pending))
    }

    /// Validate checksums of all applied migrations
    pub fn validate_checksums(&self, ledger: &dyn LedgerStore) -> Result<(), MigrationError> {
        // Status already validates checksums
        self.status(ledger).map(|_| ())
    }

    /// Migrations `up(target)` would apply, in order
    pub fn plan_up(&self, ledger: &dyn LedgerStore, target: Option<i64>) -> Result<Vec<PendingMigration>, MigrationError> {
        let status = self.status(ledger)?;
        Ok(Self::pending_up(&status, target))
    }

    /// Applied migrations `down(target)` would revert, newest first
    pub fn plan_down(&self, ledger: &dyn LedgerStore, target: Option<i64>) -> Result<Vec<MigrationRecord>, MigrationError> {
        let status = self.status(ledger)?;
        Ok(Self::applied_down(status, target))
    }

    fn pending_up(status: &MigrationStatus, target: Option<i64>) -> Vec<PendingMigration> {
        let target = target.unwrap_or(i64::MAX);
        status.pending.iter()
            .filter(|m| !m.out_of_order && m.version <= target)
            .cloned()
            .collect()
    }

    fn applied_down(status: MigrationStatus, target: Option<i64>) -> Vec<MigrationRecord> {
        let mut applied = status.applied;
        applied.sort_by_key(|m| std::cmp::Reverse(m.version));

        match target {
            Some(target) => applied.into_iter().filter(|m| m.version > target).collect(),
            None => applied.into_iter().take(1).collect(),
        }
    }

    /// Apply pending migrations up to `target` (all when `None`)
    ///
    /// Only versions newer than the latest applied one are considered. Calling
    /// this again once the target is reached is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::RunnerBusy` if another pass holds the lock,
    /// ledger load errors before the first step, and `SchemaLoad`/`Apply`/
    /// `Persist`/`Restore` errors naming the failing version. When the ledger
    /// write of a step fails, the collection saved for that step is put back
    /// first so the step is either fully recorded or not applied at all.
    pub fn up(
        &self,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        target: Option<i64>,
    ) -> Result<MigrationReport, MigrationError> {
        let _lock = MigrationLockGuard::acquire(ledger)?;
        self.set_state(RunnerState::Loading);
        let result = self.run_up(schemas, ledger, target);
        self.finish(&result);
        result
    }

    /// Roll back applied migrations
    ///
    /// With `Some(target)` every applied version newer than `target` is
    /// reverted (`Some(0)` returns to the initial state). With `None` only
    /// the most recent migration is reverted.
    ///
    /// # Errors
    ///
    /// Same as [`Migrator::up`], plus `MigrationError::MissingMigration` if an
    /// applied version is no longer registered.
    pub fn down(
        &self,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        target: Option<i64>,
    ) -> Result<MigrationReport, MigrationError> {
        let _lock = MigrationLockGuard::acquire(ledger)?;
        self.set_state(RunnerState::Loading);
        let result = self.run_down(schemas, ledger, target);
        self.finish(&result);
        result
    }

    fn finish(&self, result: &Result<MigrationReport, MigrationError>) {
        match result {
            Ok(_) => self.set_state(RunnerState::Idle),
            Err(e) => self.set_state(RunnerState::Failed(e.version())),
        }
    }

    fn run_up(
        &self,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        target: Option<i64>,
    ) -> Result<MigrationReport, MigrationError> {
        let status = self.status(ledger)?;

        for skipped in status.pending.iter().filter(|m| m.out_of_order) {
            log::warn!(
                "Skipping migration {}_{}: it is older than the latest applied version",
                skipped.version, skipped.name
            );
        }
        if let (Some(target), Some(latest)) = (target, status.latest_applied_version()) {
            if target < latest {
                log::warn!("Target {} is below the latest applied version {}; use down to roll back", target, latest);
            }
        }

        let unchanged = match target {
            Some(target) => status.applied.iter().filter(|r| r.version <= target).count(),
            None => status.applied_count,
        };
        let plan = Self::pending_up(&status, target);
        if plan.is_empty() {
            log::debug!("No pending migrations to apply");
            return Ok(MigrationReport::empty(MigrationDirection::Up, unchanged));
        }

        let mut report = MigrationReport::empty(MigrationDirection::Up, unchanged);
        for pending in plan {
            let migration = self.registry.get(pending.version)
                .ok_or(MigrationError::MissingMigration { version: pending.version })?;
            let warnings = self.run_step(migration, MigrationDirection::Up, schemas, ledger, &report.versions)?;
            report.warnings.extend(warnings);
            report.versions.push(pending.version);
        }

        log::info!("Applied {} migration(s) to collection {}", report.count(), self.collection_id);
        Ok(report)
    }

    fn run_down(
        &self,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        target: Option<i64>,
    ) -> Result<MigrationReport, MigrationError> {
        let status = self.status(ledger)?;
        let applied_count = status.applied_count;
        let plan = Self::applied_down(status, target);
        let unchanged = applied_count - plan.len();

        if plan.is_empty() {
            log::debug!("No applied migrations to roll back");
            return Ok(MigrationReport::empty(MigrationDirection::Down, unchanged));
        }

        let mut report = MigrationReport::empty(MigrationDirection::Down, unchanged);
        for record in plan {
            let migration = self.registry.get(record.version)
                .ok_or(MigrationError::MissingMigration { version: record.version })?;
            let warnings = self.run_step(migration, MigrationDirection::Down, schemas, ledger, &report.versions)?;
            report.warnings.extend(warnings);
            report.versions.push(record.version);
        }

        log::info!("Rolled back {} migration(s) on collection {}", report.count(), self.collection_id);
        Ok(report)
    }

    fn load_schema(
        &self,
        schemas: &dyn SchemaStore,
        version: i64,
        completed: &[i64],
    ) -> Result<CollectionSchema, MigrationError> {
        schemas.load(&self.collection_id).map_err(|source| MigrationError::SchemaLoad {
            collection: self.collection_id.clone(),
            version: Some(version),
            completed: completed.to_vec(),
            source,
        })
    }

    /// Run one migration in one direction and commit it
    fn run_step(
        &self,
        migration: &dyn Migration,
        direction: MigrationDirection,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        completed: &[i64],
    ) -> Result<Vec<String>, MigrationError> {
        let version = migration.version();

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("migration_step", version, name = migration.name(), %direction).entered();

        let start = Instant::now();
        let result = self.execute_step(migration, direction, schemas, ledger, completed, start);

        #[cfg(feature = "metrics")]
        match &result {
            Ok(_) => crate::metrics::METRICS.record_step(&self.collection_id, direction, start.elapsed()),
            Err(_) => crate::metrics::METRICS.record_failure(&self.collection_id, direction),
        }

        if let Err(e) = &result {
            log::error!("Migration {}_{} failed ({}): {}", version, migration.name(), direction, e);
        }
        result
    }

    fn execute_step(
        &self,
        migration: &dyn Migration,
        direction: MigrationDirection,
        schemas: &dyn SchemaStore,
        ledger: &dyn LedgerStore,
        completed: &[i64],
        start: Instant,
    ) -> Result<Vec<String>, MigrationError> {
        let version = migration.version();
        let mut schema = self.load_schema(schemas, version, completed)?;
        let previous = schema.clone();

        self.set_state(RunnerState::Applying(version));
        let mut manager = SchemaManager::new(&mut schema, direction);
        let outcome = match direction {
            MigrationDirection::Up => migration.up(&mut manager),
            MigrationDirection::Down => migration.down(&mut manager),
        };
        let warnings = manager.into_warnings();
        outcome.map_err(|source| MigrationError::Apply {
            version,
            name: migration.name().to_string(),
            direction,
            completed: completed.to_vec(),
            source,
        })?;

        self.set_state(RunnerState::Persisting(version));
        let persist_error = |source| MigrationError::Persist {
            version,
            direction,
            completed: completed.to_vec(),
            source,
        };
        schemas.save(&schema).map_err(persist_error)?;

        let execution_time = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
        let recorded = match direction {
            MigrationDirection::Up => ledger.record_applied(&MigrationRecord::new(
                version,
                migration.name().to_string(),
                migration.checksum().map(str::to_string),
                Utc::now(),
                Some(execution_time),
            )),
            MigrationDirection::Down => ledger.record_reverted(version),
        };

        if let Err(ledger_error) = recorded {
            // Put the collection back so schema and ledger agree again
            log::warn!("Ledger write for migration {} failed, restoring previous schema", version);
            return match schemas.save(&previous) {
                Ok(()) => Err(persist_error(ledger_error)),
                Err(source) => Err(MigrationError::Restore {
                    version,
                    direction,
                    completed: completed.to_vec(),
                    ledger: ledger_error,
                    source,
                }),
            };
        }

        match direction {
            MigrationDirection::Up => {
                log::info!("Applied migration {}_{} ({}ms)", version, migration.name(), execution_time);
            }
            MigrationDirection::Down => {
                log::info!("Rolled back migration {}_{}", version, migration.name());
            }
        }

        Ok(warnings)
    }
}
