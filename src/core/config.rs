//! Static endpoint configuration for the two stores.
//!
//! The migration always runs against exactly two databases: the live source
//! (read-only apart from the rebind step) and the destination being filled.
//! Both are enumerated once at startup, either from built-in defaults or
//! from a TOML file passed with `--config`.

use crate::core::error::MigrateError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Busy timeout in seconds while waiting on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_busy_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrateConfig {
    pub source: StoreConfig,
    pub destination: StoreConfig,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl MigrateConfig {
    /// Conventional layout when no config file is given: both databases
    /// live in the working directory.
    pub fn default_paths() -> Self {
        MigrateConfig {
            source: StoreConfig::new("buildtrack.db"),
            destination: StoreConfig::new("buildtrack-new.db"),
        }
    }

    pub fn load(path: &Path) -> Result<Self, MigrateError> {
        let raw = fs::read_to_string(path)?;
        let config: MigrateConfig = toml::from_str(&raw)
            .map_err(|e| MigrateError::Config(format!("{}: {e}", path.display())))?;
        if config.source.path == config.destination.path {
            return Err(MigrateError::Config(
                "source and destination must be distinct databases".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_minimal_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("migrate.toml");
        fs::write(
            &path,
            "[source]\npath = \"old.db\"\n\n[destination]\npath = \"new.db\"\nbusy_timeout_secs = 30\n",
        )
        .unwrap();
        let config = MigrateConfig::load(&path).unwrap();
        assert_eq!(config.source.path, PathBuf::from("old.db"));
        assert_eq!(config.source.busy_timeout_secs, 5);
        assert_eq!(config.destination.busy_timeout_secs, 30);
    }

    #[test]
    fn test_rejects_same_database_twice() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("migrate.toml");
        fs::write(
            &path,
            "[source]\npath = \"same.db\"\n\n[destination]\npath = \"same.db\"\n",
        )
        .unwrap();
        let err = MigrateConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("migrate.toml");
        fs::write(&path, "[source\npath=").unwrap();
        assert!(matches!(
            MigrateConfig::load(&path),
            Err(MigrateError::Config(_))
        ));
    }
}
