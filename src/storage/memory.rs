//! In-process adapter
//!
//! Mirrors the SQLite adapter's contract, including null-on-delete for logs
//! and rejecting logs that reference an unknown severity.

use super::{
    ensure_not_blank, ensure_single_row, ensure_valid_id, LogStore, Model, Repository,
    SeverityStore, StoreError, StoreResult, MISSING_SEVERITY_ID,
};
use crate::models::{Log, Severity};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Rows of one entity keyed by id
struct MemoryTable<M: Model> {
    rows: BTreeMap<M::Id, M>,
}

impl<M: Model> MemoryTable<M> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    fn get(&self, id: &M::Id) -> Option<M> {
        self.rows.get(id).cloned()
    }

    fn all(&self) -> Vec<M> {
        self.rows.values().cloned().collect()
    }

    fn insert(&mut self, id: M::Id, model: M) {
        self.rows.insert(id, model);
    }

    /// Returns the number of rows replaced (0 or 1)
    fn replace(&mut self, model: &M) -> u64 {
        match self.rows.get_mut(&model.id()) {
            Some(row) => {
                *row = model.clone();
                1
            }
            None => 0,
        }
    }

    /// Returns the number of rows removed (0 or 1)
    fn remove(&mut self, id: &M::Id) -> u64 {
        u64::from(self.rows.remove(id).is_some())
    }
}

struct Tables {
    severities: MemoryTable<Severity>,
    logs: MemoryTable<Log>,
}

impl Tables {
    fn ensure_severity_exists(&self, severity_id: Option<i64>) -> StoreResult<()> {
        match severity_id {
            Some(id) if self.severities.get(&id).is_none() => Err(StoreError::InvalidArgument(
                format!("log references unknown severity {}", id),
            )),
            _ => Ok(()),
        }
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_severity_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                severities: MemoryTable::new(),
                logs: MemoryTable::new(),
            }),
            next_severity_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_timestamp(mut logs: Vec<Log>) -> Vec<Log> {
    logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    logs
}

#[async_trait]
impl Repository<Severity> for MemoryStore {
    async fn get(&self, id: i64) -> StoreResult<Option<Severity>> {
        ensure_valid_id::<Severity>(&id)?;
        Ok(self.tables.read().await.severities.get(&id))
    }

    async fn get_all(&self) -> StoreResult<Vec<Severity>> {
        Ok(self.tables.read().await.severities.all())
    }

    async fn create(&self, severity: &Severity) -> StoreResult<i64> {
        ensure_not_blank(severity)?;

        let id = self.next_severity_id.fetch_add(1, Ordering::Relaxed);
        let mut row = severity.clone();
        row.id = id;
        self.tables.write().await.severities.insert(id, row);
        Ok(id)
    }

    async fn update(&self, severity: &Severity) -> StoreResult<()> {
        ensure_valid_id::<Severity>(&severity.id)?;
        ensure_not_blank(severity)?;

        let affected = self.tables.write().await.severities.replace(severity);
        ensure_single_row("update severity", affected)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        ensure_valid_id::<Severity>(&id)?;

        let mut tables = self.tables.write().await;
        let affected = tables.severities.remove(&id);
        if affected == 1 {
            for log in tables.logs.rows.values_mut() {
                if log.severity_id == Some(id) {
                    log.severity_id = None;
                }
            }
        }
        ensure_single_row("delete severity", affected)
    }
}

#[async_trait]
impl SeverityStore for MemoryStore {
    async fn get_name_by_id(&self, id: i64) -> StoreResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.severities.get(&id).map(|s| s.name))
    }

    async fn get_id_by_name(&self, name: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let id = tables
            .severities
            .rows
            .values()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .unwrap_or(MISSING_SEVERITY_ID);
        Ok(id)
    }

    async fn get_logs_for_severity(&self, id: i64) -> StoreResult<Vec<Log>> {
        ensure_valid_id::<Severity>(&id)?;

        let tables = self.tables.read().await;
        let logs = tables
            .logs
            .rows
            .values()
            .filter(|log| log.severity_id == Some(id))
            .cloned()
            .collect();
        Ok(sort_by_timestamp(logs))
    }
}

#[async_trait]
impl Repository<Log> for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Log>> {
        ensure_valid_id::<Log>(&id)?;
        Ok(self.tables.read().await.logs.get(&id))
    }

    async fn get_all(&self) -> StoreResult<Vec<Log>> {
        let logs = self.tables.read().await.logs.all();
        Ok(sort_by_timestamp(logs))
    }

    async fn create(&self, log: &Log) -> StoreResult<Uuid> {
        ensure_not_blank(log)?;

        let mut tables = self.tables.write().await;
        tables.ensure_severity_exists(log.severity_id)?;

        let id = Uuid::new_v4();
        let mut row = log.clone();
        row.id = id;
        tables.logs.insert(id, row);
        Ok(id)
    }

    async fn update(&self, log: &Log) -> StoreResult<()> {
        ensure_valid_id::<Log>(&log.id)?;
        ensure_not_blank(log)?;

        let mut tables = self.tables.write().await;
        tables.ensure_severity_exists(log.severity_id)?;
        let affected = tables.logs.replace(log);
        ensure_single_row("update log", affected)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        ensure_valid_id::<Log>(&id)?;

        let affected = self.tables.write().await.logs.remove(&id);
        ensure_single_row("delete log", affected)
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn get_severity_of(&self, id: Uuid) -> StoreResult<Option<Severity>> {
        ensure_valid_id::<Log>(&id)?;

        let tables = self.tables.read().await;
        let severity = tables
            .logs
            .get(&id)
            .and_then(|log| log.severity_id)
            .and_then(|severity_id| tables.severities.get(&severity_id));
        Ok(severity)
    }
}
