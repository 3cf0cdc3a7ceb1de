//! Schemaward Migration CLI Tool
//!
//! Command-line interface for replaying collection migrations against a
//! local data directory. Suitable for CI/CD pipelines: exits non-zero on any
//! failure and names the failing version.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use schemaward::migration::{load_registry, MigrationError, Migrator};
use schemaward::store::{JsonFileStore, SchemaStore};
use schemaward::MigrateConfig;
use schemaward_migrate::generate::generate_migration;
use schemaward_migrate::render::render_schema;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Migration management tool for Schemaward collections")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory holding collection definitions and the ledger
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Migrations directory path
    #[arg(long)]
    migrations_dir: Option<PathBuf>,

    /// Id of the collection to migrate
    #[arg(long)]
    collection: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show migration status (applied vs pending)
    Status,

    /// Apply pending migrations
    Up {
        /// Highest version to apply (default: all pending)
        #[arg(long)]
        to: Option<i64>,

        /// Dry run - show what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Rollback migrations
    Down {
        /// Revert every version newer than this one (default: only the latest)
        #[arg(long)]
        to: Option<i64>,

        /// Dry run - show what would be rolled back
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate checksums of applied migrations
    Validate,

    /// Generate a new migration script
    Generate {
        /// Migration name (e.g., "updated_tasks")
        name: String,
    },

    /// Show detailed migration information
    Info {
        /// Show information for a specific migration version
        #[arg(long)]
        version: Option<i64>,
    },

    /// Print the current collection definition as JSON
    Schema {
        /// Print one line per field instead of JSON
        #[arg(long)]
        table: bool,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red(), e);
            process::exit(1);
        }
    };
    log::debug!("Using configuration: {:?}", config);

    let result = run(cli.command, &config);

    match result {
        Ok(()) => {
            if !cli.quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red(), e);
            if let Some(migration_error) = e.downcast_ref::<MigrationError>() {
                if let Some(version) = migration_error.version() {
                    eprintln!("   Failing version: {}", version);
                }
                let completed = migration_error.completed();
                if !completed.is_empty() {
                    eprintln!("   Completed before the failure: {:?}", completed);
                }
            }
            process::exit(1);
        }
    }
}

/// File and environment settings, overridden by command-line flags
fn resolve_config(cli: &Cli) -> anyhow::Result<MigrateConfig> {
    let mut config = MigrateConfig::load().context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.migrations_dir {
        config.migrations_dir = dir.clone();
    }
    if let Some(collection) = &cli.collection {
        config.collection = collection.clone();
    }
    Ok(config)
}

fn run(command: Commands, config: &MigrateConfig) -> anyhow::Result<()> {
    if let Commands::Generate { name } = &command {
        return handle_generate(&config.migrations_dir, name);
    }

    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;

    if let Commands::Schema { table } = command {
        return handle_schema(&store, &config.collection, table);
    }

    let registry = load_registry(&config.migrations_dir)?;
    let migrator = Migrator::new(registry, config.collection.clone());

    match command {
        Commands::Status => handle_status(&migrator, &store),
        Commands::Up { to, dry_run } => handle_up(&migrator, &store, to, dry_run),
        Commands::Down { to, dry_run } => handle_down(&migrator, &store, to, dry_run),
        Commands::Validate => handle_validate(&migrator, &store),
        Commands::Info { version } => handle_info(&migrator, &store, version),
        Commands::Generate { .. } | Commands::Schema { .. } => Ok(()),
    }
}

fn handle_status(migrator: &Migrator, store: &JsonFileStore) -> anyhow::Result<()> {
    let status = migrator.status(store)?;

    println!("\n📊 Migration Status ({})\n", migrator.collection_id());

    if !status.applied.is_empty() {
        println!("✅ Applied Migrations ({}):", status.applied_count);
        for record in &status.applied {
            let time_str = record
                .execution_time_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "N/A".to_string());
            println!(
                "  ✓ {}_{} ({}, {})",
                record.version,
                record.name,
                record.applied_at.format("%Y-%m-%d %H:%M:%S"),
                time_str
            );
        }
    } else {
        println!("✅ Applied Migrations: None");
    }

    println!();

    if !status.pending.is_empty() {
        println!("⏳ Pending Migrations ({}):", status.pending_count);
        for pending in &status.pending {
            if pending.out_of_order {
                println!(
                    "  {} {}_{} (older than the latest applied version, will be skipped)",
                    "⚠".yellow(),
                    pending.version,
                    pending.name
                );
            } else {
                println!("  ⏳ {}_{} (pending)", pending.version, pending.name);
            }
        }
    } else {
        println!("⏳ Pending Migrations: None");
    }

    println!("\n📈 Summary: {} applied, {} pending", status.applied_count, status.pending_count);

    Ok(())
}

fn handle_up(migrator: &Migrator, store: &JsonFileStore, to: Option<i64>, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        let plan = migrator.plan_up(store, to)?;
        if plan.is_empty() {
            println!("No pending migrations to apply");
            return Ok(());
        }

        println!("Would apply {} migration(s):", plan.len());
        for (i, pending) in plan.iter().enumerate() {
            println!("  {}. {}_{}", i + 1, pending.version, pending.name);
        }
        return Ok(());
    }

    println!("Applying migrations...");
    let report = migrator.up(store, store, to)?;

    if report.count() > 0 {
        println!("✅ Successfully applied {} migration(s): {:?}", report.count(), report.versions);
    } else {
        println!("✅ No migrations to apply");
    }

    Ok(())
}

fn handle_down(migrator: &Migrator, store: &JsonFileStore, to: Option<i64>, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        let plan = migrator.plan_down(store, to)?;
        if plan.is_empty() {
            println!("No applied migrations to rollback");
            return Ok(());
        }

        println!("Would rollback {} migration(s):", plan.len());
        for (i, record) in plan.iter().enumerate() {
            println!("  {}. {}_{}", i + 1, record.version, record.name);
        }
        return Ok(());
    }

    println!("Rolling back migrations...");
    let report = migrator.down(store, store, to)?;

    for warning in &report.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    if report.count() > 0 {
        println!("✅ Successfully rolled back {} migration(s): {:?}", report.count(), report.versions);
    } else {
        println!("✅ No migrations to rollback");
    }

    Ok(())
}

fn handle_validate(migrator: &Migrator, store: &JsonFileStore) -> anyhow::Result<()> {
    println!("Validating checksums...");
    migrator.validate_checksums(store)?;
    println!("✅ All checksums valid");
    Ok(())
}

fn handle_generate(migrations_dir: &Path, name: &str) -> anyhow::Result<()> {
    let filepath = generate_migration(migrations_dir, name, Utc::now())?;

    println!("✅ Generated migration: {}", filepath.display());
    println!("   Fill in the \"up\" and \"down\" edit lists");

    Ok(())
}

fn handle_info(migrator: &Migrator, store: &JsonFileStore, version: Option<i64>) -> anyhow::Result<()> {
    let status = migrator.status(store)?;

    if let Some(version) = version {
        // Show info for specific migration
        if let Some(record) = status.applied.iter().find(|r| r.version == version) {
            println!("\n📋 Migration Information\n");
            println!("Version: {}", record.version);
            println!("Name: {}", record.name);
            println!("Checksum: {}", record.checksum.as_deref().unwrap_or("N/A"));
            println!("Applied At: {}", record.applied_at.format("%Y-%m-%d %H:%M:%S UTC"));
            if let Some(ms) = record.execution_time_ms {
                println!("Execution Time: {}ms", ms);
            }
        } else if let Some(pending) = status.pending.iter().find(|p| p.version == version) {
            let checksum = migrator.registry().get(version).and_then(|m| m.checksum().map(str::to_string));
            println!("\n📋 Migration Information (Pending)\n");
            println!("Version: {}", pending.version);
            println!("Name: {}", pending.name);
            println!("Checksum: {}", checksum.as_deref().unwrap_or("N/A"));
            println!("Status: Pending");
            if pending.out_of_order {
                println!("Note: older than the latest applied version, `up` will skip it");
            }
        } else {
            bail!("Migration version {} is not registered", version);
        }
    } else {
        // Show summary info
        println!("\n📋 Migration System Information\n");
        println!("Collection: {}", migrator.collection_id());
        println!("Total Migrations: {}", status.total);
        println!("Applied: {}", status.applied_count);
        println!("Pending: {}", status.pending_count);

        if let Some(latest) = status.latest_applied_version() {
            println!("Latest Applied Version: {}", latest);
        }

        if let Some(next) = status.next_pending_version() {
            println!("Next Pending Version: {}", next);
        }
    }

    Ok(())
}

fn handle_schema(store: &JsonFileStore, collection: &str, table: bool) -> anyhow::Result<()> {
    let schema = store
        .load(collection)
        .with_context(|| format!("Failed to load collection {}", collection))?;
    if table {
        print!("{}", render_schema(&schema));
    } else {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    }
    Ok(())
}
