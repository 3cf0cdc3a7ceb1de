use crate::migration::MigrationDirection;
use once_cell::sync::Lazy;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};
use std::time::Duration;

pub static METRICS: Lazy<MigrationMetrics> = Lazy::new(MigrationMetrics::init);

pub struct MigrationMetrics {
    pub applied_total: Counter<u64>,
    pub reverted_total: Counter<u64>,
    pub failed_total: Counter<u64>,
    pub step_duration: Histogram<f64>,
}

impl MigrationMetrics {
    pub fn init() -> Self {
        let meter = global::meter("schemaward");

        let applied_total = meter.u64_counter("schemaward_migrations_applied_total")
            .with_description("Migrations applied").build();

        let reverted_total = meter.u64_counter("schemaward_migrations_reverted_total")
            .with_description("Migrations rolled back").build();

        let failed_total = meter.u64_counter("schemaward_migrations_failed_total")
            .with_description("Migration steps that failed").build();

        let step_duration = meter.f64_histogram("schemaward_migration_step_seconds")
            .with_description("Duration of a single migration step including persistence").build();

        Self {
            applied_total,
            reverted_total,
            failed_total,
            step_duration,
        }
    }

    pub fn record_step(&self, collection: &str, direction: MigrationDirection, elapsed: Duration) {
        let attrs = [
            KeyValue::new("collection", collection.to_string()),
            KeyValue::new("direction", direction.to_string()),
        ];
        match direction {
            MigrationDirection::Up => self.applied_total.add(1, &attrs),
            MigrationDirection::Down => self.reverted_total.add(1, &attrs),
        }
        self.step_duration.record(elapsed.as_secs_f64(), &attrs);
    }

    pub fn record_failure(&self, collection: &str, direction: MigrationDirection) {
        self.failed_total.add(
            1,
            &[
                KeyValue::new("collection", collection.to_string()),
                KeyValue::new("direction", direction.to_string()),
            ],
        );
    }
}
