//! Process-level configuration for embedding the core.
//!
//! # Responsibility
//! - Collect database location and logging settings from explicit values or
//!   the environment.
//! - Open the configured database and start logging from one place.
//!
//! # Invariants
//! - `db_path = None` means an in-memory database.
//! - Logging is only started when `log_dir` is set.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging};
use rusqlite::Connection;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "LEADFLOW_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LEADFLOW_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LEADFLOW_LOG_DIR";

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `LEADFLOW_DB_PATH`, `LEADFLOW_LOG_LEVEL` and `LEADFLOW_LOG_DIR`.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR),
        }
    }

    /// Starts logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), String> {
        match self.log_dir.as_deref() {
            Some(log_dir) => init_logging(&self.log_level, log_dir),
            None => Ok(()),
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match self.db_path.as_ref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn lookup_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/var/lib/leadflow/leadflow.db"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/var/log/leadflow"),
        ]);
        let config = CoreConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/leadflow/leadflow.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/leadflow"));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = CoreConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn default_config_opens_in_memory_database() {
        let conn = CoreConfig::default().open_db().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM operators;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
