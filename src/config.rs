//! Runner configuration
//!
//! Settings come from `config/config.toml` (optional, `[migrate]` section)
//! overlaid by `SCHEMAWARD__MIGRATE__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "SCHEMAWARD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigrateConfig {
    /// Id of the collection the migrations edit
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    /// Directory holding collection definitions and the ledger
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_collection() -> String {
    "pbc_3577811883".to_string()
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("pb_data")
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            migrations_dir: default_migrations_dir(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct Settings {
    #[serde(default)]
    migrate: MigrateConfig,
}

impl MigrateConfig {
    /// Load from `config/config.toml`, falling back to env vars only
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        match Self::load_from(path) {
            Ok(config) => Ok(config),
            Err(err) if path.exists() => {
                log::warn!("Failed to load {}, falling back to env: {}", DEFAULT_CONFIG_FILE, err);
                Self::build(Config::builder().add_source(Self::environment()))
            }
            Err(err) => Err(err),
        }
    }

    /// Load from a specific file (missing files are allowed) and env vars
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_layered(path, Self::environment())
    }

    fn load_layered(path: &Path, environment: Environment) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment);
        Self::build(builder)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).separator("__")
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize().map_err(|e| {
            ConfigError::Message(format!("Migration configuration could not be loaded: {e}"))
        })?;
        Ok(settings.migrate)
    }
}
