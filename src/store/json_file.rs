use crate::migration::MigrationRecord;
use crate::schema::CollectionSchema;
use crate::store::{LedgerStore, SchemaStore, StoreError};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const COLLECTIONS_DIR: &str = "collections";
const LEDGER_FILE: &str = "migrations.json";
const LOCK_FILE: &str = "migrations.lock";

/// Directory-backed schema and ledger storage
///
/// Layout under the data directory:
///
/// ```text
/// collections/<collection_id>.json   one CollectionSchema per file
/// migrations.json                    applied MigrationRecords
/// migrations.lock                    present while a runner holds the lock
/// ```
///
/// Every write goes to a sibling temporary file that is renamed into place,
/// so a crashed write never leaves a half-written schema behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Record owner details in a freshly created lock file
///
/// The file is removed again if the write fails, so a lock that was never
/// fully taken does not block later runs.
fn write_lock_owner(path: &Path, mut file: impl Write) -> Result<(), StoreError> {
    let owner = format!("pid={} acquired_at={}\n", std::process::id(), Utc::now().to_rfc3339());
    if let Err(e) = file.write_all(owner.as_bytes()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            log::warn!("Failed to remove partial lock file {}: {}", path.display(), cleanup);
        }
        return Err(io_error(path, e));
    }
    Ok(())
}

impl JsonFileStore {
    /// Open (and create if needed) a data directory
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let collections = root.join(COLLECTIONS_DIR);
        fs::create_dir_all(&collections).map_err(|e| io_error(&collections, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection_id.is_empty()
            && collection_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidId(collection_id.to_string()));
        }
        Ok(self.root.join(COLLECTIONS_DIR).join(format!("{collection_id}.json")))
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                path: path.display().to_string(),
                source,
            })
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Malformed {
            path: path.display().to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_error(path, e))
    }

    fn read_ledger(&self) -> Result<Vec<MigrationRecord>, StoreError> {
        let mut records: Vec<MigrationRecord> =
            Self::read_json(&self.ledger_path())?.unwrap_or_default();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }
}

impl SchemaStore for JsonFileStore {
    fn load(&self, collection_id: &str) -> Result<CollectionSchema, StoreError> {
        let path = self.collection_path(collection_id)?;
        Self::read_json(&path)?.ok_or_else(|| StoreError::NotFound(collection_id.to_string()))
    }

    fn save(&self, schema: &CollectionSchema) -> Result<(), StoreError> {
        let path = self.collection_path(&schema.id)?;
        Self::write_json(&path, schema)
    }
}

impl LedgerStore for JsonFileStore {
    fn load_applied(&self) -> Result<Vec<MigrationRecord>, StoreError> {
        self.read_ledger()
    }

    fn record_applied(&self, record: &MigrationRecord) -> Result<(), StoreError> {
        let mut records = self.read_ledger()?;
        if records.iter().any(|r| r.version == record.version) {
            return Err(StoreError::Conflict(format!(
                "version {} is already recorded as applied",
                record.version
            )));
        }
        records.push(record.clone());
        records.sort_by_key(|r| r.version);
        Self::write_json(&self.ledger_path(), &records)
    }

    fn record_reverted(&self, version: i64) -> Result<(), StoreError> {
        let mut records = self.read_ledger()?;
        records.retain(|r| r.version != version);
        Self::write_json(&self.ledger_path(), &records)
    }

    fn try_lock(&self) -> Result<bool, StoreError> {
        let path = self.lock_path();
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(io_error(&path, e)),
        };

        write_lock_owner(&path, file)?;
        Ok(true)
    }

    fn unlock(&self) -> Result<(), StoreError> {
        let path = self.lock_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn describe_lock(&self) -> String {
        self.lock_path().display().to_string()
    }
}
