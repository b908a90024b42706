use tracing::debug;

use super::errors::StorageError;

/// Key under which the measurement records are persisted
pub const RECORDS_KEY: &str = "bp_records";

/// Key under which the saved analysis reports are persisted
pub const REPORTS_KEY: &str = "bp_ai_reports";

/// Durable key-value port the record store writes through.
///
/// Implementations must make `put` durable before returning `Ok`; the store
/// treats a returned `Ok` as "this mutation survives a crash".
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Short name used in logs and health output
    fn backend_name(&self) -> &'static str;
}

/// SQLite-backed key-value storage
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: crate::database::SqlitePool,
}

#[cfg(feature = "sqlite")]
impl SqliteStorage {
    /// Wrap an initialized (migrated) pool
    pub fn new(pool: crate::database::SqlitePool) -> Self {
        Self { pool }
    }

    /// Build the pool from configuration and wrap it
    pub fn open(config: &crate::database::DatabaseConfig) -> Result<Self, StorageError> {
        let pool = crate::database::create_sqlite_pool(config)?;
        Ok(Self::new(pool))
    }
}

#[cfg(feature = "sqlite")]
impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        use rusqlite::OptionalExtension;

        debug!("Reading key '{}' from SQLite", key);
        let conn = self.pool.get()?;

        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("Writing key '{}' to SQLite ({} bytes)", key, value.len());
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, chrono::Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
