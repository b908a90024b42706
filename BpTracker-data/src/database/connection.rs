//! Database connection module for the BpTracker application
//!
//! The durable store is a single SQLite file holding a small key-value
//! table. The pool is built from configuration and handed to whoever needs
//! it; there is no process-wide pool.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "sqlite")]
use super::migrations::run_sqlite_migrations;

/// Default location of the SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "./data/bp_tracker.db";

/// Shared SQLite connection pool
#[cfg(feature = "sqlite")]
pub type SqlitePool = Arc<r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>>;

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    /// Filesystem error while preparing the database location
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub pool_size: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            pool_size: 4,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let sqlite_path = env::var("DB_SQLITE_PATH").unwrap_or(defaults.sqlite_path);

        let pool_size = match env::var("DB_POOL_SIZE") {
            Ok(value) => value.parse::<u32>().map_err(|_| {
                DatabaseError::ConfigError(format!("DB_POOL_SIZE must be a positive integer, got '{}'", value))
            })?,
            Err(_) => defaults.pool_size,
        };

        if pool_size == 0 {
            return Err(DatabaseError::ConfigError("DB_POOL_SIZE must be at least 1".to_string()));
        }

        let timeout_seconds = match env::var("DB_TIMEOUT_SECONDS") {
            Ok(value) => value.parse::<u64>().map_err(|_| {
                DatabaseError::ConfigError(format!("DB_TIMEOUT_SECONDS must be an integer, got '{}'", value))
            })?,
            Err(_) => defaults.timeout_seconds,
        };

        info!(
            "Database configuration: path={}, pool_size={}, timeout={}s",
            sqlite_path, pool_size, timeout_seconds
        );

        Ok(Self {
            sqlite_path,
            pool_size,
            timeout_seconds,
        })
    }
}

/// Open (creating if needed) the SQLite database and run migrations
#[cfg(feature = "sqlite")]
pub fn create_sqlite_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    use rusqlite::OpenFlags;

    info!("Initializing SQLite database at: {}", config.sqlite_path);

    if let Some(parent) = Path::new(&config.sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = r2d2_sqlite::SqliteConnectionManager::file(&config.sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    let conn = pool.get()?;
    run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;
    debug!("SQLite connection pool ready");

    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.sqlite_path, DEFAULT_SQLITE_PATH);
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_create_pool_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("bp_tracker_pool_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("test.db");
        let config = DatabaseConfig {
            sqlite_path: path.to_string_lossy().to_string(),
            ..DatabaseConfig::default()
        };

        let pool = create_sqlite_pool(&config).expect("pool should be created");
        assert!(path.exists());

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        drop(conn);
        drop(pool);
        let _ = std::fs::remove_dir_all(dir);
    }
}
