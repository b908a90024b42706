// Repository module structure
pub mod errors;
mod in_memory;
mod record_store;
mod storage;

// Re-export commonly used types
pub use errors::{RepositoryError, StorageError};
pub use in_memory::InMemoryStorage;
pub use record_store::RecordStore;
pub use storage::{KeyValueStorage, RECORDS_KEY, REPORTS_KEY};

#[cfg(feature = "sqlite")]
pub use storage::SqliteStorage;
