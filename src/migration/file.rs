//! Migration file discovery and parsing

use crate::migration::{MigrationError, MigrationRegistry, ScriptedMigration};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// `{version}_{name}.json`, e.g. `1742036235_updated_tasks.json`
static FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)] // Constant pattern
    Regex::new(r"^(\d{1,18})_([A-Za-z0-9_]+)\.json$").expect("valid migration file pattern")
});

/// Represents a discovered migration file
#[derive(Debug, Clone)]
pub struct MigrationFile {
    /// Path to the migration file
    pub path: PathBuf,

    /// Migration version (unix timestamp)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,
}

impl MigrationFile {
    /// Parse a migration file name into version and name
    ///
    /// # Example
    /// - `1742036235_updated_tasks.json` → version: 1742036235, name: "updated_tasks"
    pub fn parse_filename(filename: &str) -> Result<(i64, String), MigrationError> {
        let invalid = || {
            MigrationError::InvalidFormat(format!(
                "migration file name '{filename}' does not match the expected pattern {{version}}_{{name}}.json"
            ))
        };

        let caps = FILE_NAME.captures(filename).ok_or_else(invalid)?;
        let (Some(version), Some(name)) = (caps.get(1), caps.get(2)) else {
            return Err(invalid());
        };
        let version = version.as_str().parse::<i64>().map_err(|_| invalid())?;

        Ok((version, name.as_str().to_string()))
    }

    /// Read and parse the script
    pub fn load(&self) -> Result<ScriptedMigration, MigrationError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            MigrationError::FileNotFound(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        ScriptedMigration::parse(self.version, self.name.clone(), &content)
    }
}

/// Discover all migration files in a directory, sorted by version
///
/// Files without a `.json` extension are ignored.
///
/// # Errors
///
/// Returns errors if:
/// - The directory doesn't exist or can't be read
/// - A `.json` file has an invalid name
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    if !migrations_dir.is_dir() {
        return Err(MigrationError::FileNotFound(format!(
            "migrations directory {} does not exist",
            migrations_dir.display()
        )));
    }

    let entries = fs::read_dir(migrations_dir).map_err(|e| {
        MigrationError::FileNotFound(format!(
            "failed to read migrations directory {}: {}",
            migrations_dir.display(),
            e
        ))
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| MigrationError::FileNotFound(format!("failed to read directory entry: {e}")))?
            .path();

        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MigrationError::InvalidFormat(format!("invalid filename: {}", path.display())))?;

        let (version, name) = MigrationFile::parse_filename(filename)?;
        migrations.push(MigrationFile { path, version, name });
    }

    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}

/// Build a registry from every script in a directory
///
/// # Errors
///
/// Returns discovery and parse errors, and `MigrationError::DuplicateVersion`
/// if two files share a version.
pub fn load_registry(migrations_dir: impl AsRef<Path>) -> Result<MigrationRegistry, MigrationError> {
    let mut registry = MigrationRegistry::default();
    for file in discover_migrations(migrations_dir.as_ref())? {
        log::debug!("Loading migration script {}", file.path.display());
        registry.register(Box::new(file.load()?))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Migration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_filename() {
        let (version, name) = MigrationFile::parse_filename("1742036235_updated_tasks.json").unwrap();
        assert_eq!(version, 1742036235);
        assert_eq!(name, "updated_tasks");
    }

    #[test]
    fn test_parse_filename_rejects_bad_names() {
        for bad in ["updated_tasks.json", "1742036235.json", "17420x_a.json", "1742036235_a-b.json"] {
            assert!(
                matches!(MigrationFile::parse_filename(bad), Err(MigrationError::InvalidFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_discover_sorts_and_skips_other_files() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("1742024685_b.json"), r#"{"up": []}"#).expect("write");
        fs::write(dir.path().join("1741976865_a.json"), r#"{"up": []}"#).expect("write");
        fs::write(dir.path().join("README.md"), "notes").expect("write");

        let files = discover_migrations(dir.path()).expect("discover");
        let versions: Vec<i64> = files.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![1741976865, 1742024685]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let err = discover_migrations(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, MigrationError::FileNotFound(_)));
    }

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_load_registry_rejects_duplicate_versions() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("100_first.json"), r#"{"up": []}"#).expect("write");
        fs::write(dir.path().join("100_second.json"), r#"{"up": []}"#).expect("write");

        let err = load_registry(dir.path()).unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateVersion { version: 100, .. }));
    }

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_load_registry_checksums_file_content() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let body = r#"{"up": [{"op": "rename_collection", "name": "tasks"}]}"#;
        fs::write(dir.path().join("1741976865_updated_task.json"), body).expect("write");

        let registry = load_registry(dir.path()).expect("load");
        let migration = registry.get(1741976865).expect("registered");
        assert_eq!(migration.checksum(), Some(crate::migration::calculate_checksum(body.as_bytes()).as_str()));
    }
}
