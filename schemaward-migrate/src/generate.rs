//! Scaffolding for new migration scripts

use chrono::{DateTime, Utc};
use schemaward::migration::{MigrationError, MigrationFile};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Write an empty `<unix-timestamp>_<name>.json` script into `migrations_dir`
///
/// The directory is created if needed. Existing files are never overwritten.
///
/// # Errors
///
/// Returns `MigrationError::InvalidFormat` if `name` would not produce a
/// discoverable file name, and `MigrationError::FileNotFound` on I/O failure
/// or when a script with the same version and name already exists.
pub fn generate_migration(
    migrations_dir: &Path,
    name: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, MigrationError> {
    let filename = format!("{}_{}.json", now.timestamp(), name);
    MigrationFile::parse_filename(&filename)?;

    fs::create_dir_all(migrations_dir)
        .map_err(|e| MigrationError::FileNotFound(format!("Failed to create migrations directory: {}", e)))?;

    let filepath = migrations_dir.join(&filename);
    if filepath.exists() {
        return Err(MigrationError::FileNotFound(format!(
            "Refusing to overwrite existing migration {}",
            filepath.display()
        )));
    }

    let template = json!({
        "name": name,
        "up": [],
        "down": [],
    });
    let body = serde_json::to_string_pretty(&template)
        .map_err(|e| MigrationError::InvalidFormat(format!("Failed to render template: {}", e)))?;

    fs::write(&filepath, body + "\n")
        .map_err(|e| MigrationError::FileNotFound(format!("Failed to write migration file: {}", e)))?;

    log::debug!("Generated {}", filepath.display());
    Ok(filepath)
}
