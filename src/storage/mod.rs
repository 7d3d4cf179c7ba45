//! Persistence for severities and logs
//!
//! Both entities share one generic [`Repository`] capability. Entity-specific
//! lookups live in [`SeverityStore`] and [`LogStore`]. Exactly one adapter is
//! selected at startup from `database.backend`:
//! - `sqlite`: sqlx pool with automatic migrations
//! - `memory`: in-process tables, nothing survives a restart

pub mod memory;
pub mod sqlite;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::models::{Log, Severity};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Returned by [`SeverityStore::get_id_by_name`] when no severity has the name
pub const MISSING_SEVERITY_ID: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{operation} affected {actual} rows, expected exactly 1")]
    RowsAffected { operation: &'static str, actual: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// An entity the generic repository can persist
pub trait Model: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + fmt::Display + Send + Sync + 'static;

    /// Entity name used in error messages and metrics labels
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;

    fn is_valid_id(id: &Self::Id) -> bool;

    /// True when a required text field is missing
    fn is_blank(&self) -> bool;
}

impl Model for Severity {
    type Id = i64;
    const ENTITY: &'static str = "severity";

    fn id(&self) -> i64 {
        self.id
    }

    fn is_valid_id(id: &i64) -> bool {
        *id > 0
    }

    fn is_blank(&self) -> bool {
        self.name.trim().is_empty() || self.description.trim().is_empty()
    }
}

impl Model for Log {
    type Id = Uuid;
    const ENTITY: &'static str = "log";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_valid_id(id: &Uuid) -> bool {
        !id.is_nil()
    }

    fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }
}

/// CRUD shared by every entity
///
/// `update` and `delete` must touch exactly one row; anything else is
/// reported as [`StoreError::RowsAffected`].
#[async_trait]
pub trait Repository<M: Model>: Send + Sync {
    async fn get(&self, id: M::Id) -> StoreResult<Option<M>>;

    async fn get_all(&self) -> StoreResult<Vec<M>>;

    /// Persist a new record and return the id the store assigned
    async fn create(&self, model: &M) -> StoreResult<M::Id>;

    async fn update(&self, model: &M) -> StoreResult<()>;

    async fn delete(&self, id: M::Id) -> StoreResult<()>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait SeverityStore: Repository<Severity> {
    async fn get_name_by_id(&self, id: i64) -> StoreResult<Option<String>>;

    /// Never fails on a miss, returns [`MISSING_SEVERITY_ID`] instead
    async fn get_id_by_name(&self, name: &str) -> StoreResult<i64>;

    async fn get_logs_for_severity(&self, id: i64) -> StoreResult<Vec<Log>>;
}

#[async_trait]
pub trait LogStore: Repository<Log> {
    /// Severity currently referenced by the log, if any
    async fn get_severity_of(&self, id: Uuid) -> StoreResult<Option<Severity>>;
}

/// The adapter selected at startup, shared by handlers and the ingestion worker
#[derive(Clone)]
pub struct Storage {
    pub logs: Arc<dyn LogStore>,
    pub severities: Arc<dyn SeverityStore>,
}

impl Storage {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: LogStore + SeverityStore + 'static,
    {
        Self {
            logs: store.clone(),
            severities: store,
        }
    }

    /// Fresh in-process storage
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }
}

/// Open the configured backend
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Storage> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::connect(config).await?;
            tracing::info!(url = %config.url, "SQLite storage ready");
            Ok(Storage::from_store(Arc::new(store)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data will be lost on shutdown");
            Ok(Storage::memory())
        }
    }
}

pub(crate) fn ensure_valid_id<M: Model>(id: &M::Id) -> StoreResult<()> {
    if M::is_valid_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidArgument(format!(
            "{} id {} isn't valid",
            M::ENTITY,
            id
        )))
    }
}

pub(crate) fn ensure_not_blank<M: Model>(model: &M) -> StoreResult<()> {
    if model.is_blank() {
        Err(StoreError::InvalidArgument(format!(
            "{} payload is empty",
            M::ENTITY
        )))
    } else {
        Ok(())
    }
}

pub(crate) fn ensure_single_row(operation: &'static str, actual: u64) -> StoreResult<()> {
    if actual == 1 {
        Ok(())
    } else {
        Err(StoreError::RowsAffected { operation, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validity() {
        assert!(Severity::is_valid_id(&1));
        assert!(!Severity::is_valid_id(&0));
        assert!(!Severity::is_valid_id(&MISSING_SEVERITY_ID));
        assert!(Log::is_valid_id(&Uuid::new_v4()));
        assert!(!Log::is_valid_id(&Uuid::nil()));
    }

    #[test]
    fn test_blank_models() {
        assert!(Severity::new("", "desc").is_blank());
        assert!(Severity::new("Error", "  ").is_blank());
        assert!(!Severity::new("Error", "Something broke").is_blank());
        assert!(Log::new(" ", 1).is_blank());
        assert!(!Log::new("disk full", 1).is_blank());
    }

    #[test]
    fn test_boundary_helpers() {
        assert!(matches!(
            ensure_valid_id::<Severity>(&0),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(ensure_single_row("delete", 1).is_ok());

        let err = ensure_single_row("update", 0).unwrap_err();
        assert_eq!(err.to_string(), "update affected 0 rows, expected exactly 1");
    }
}
