//! SQLite adapter
//!
//! Logs keep their UUID as TEXT and their timestamp as unix milliseconds.
//! Foreign keys are enforced so deleting a severity nulls `logs.severity_id`.

use super::{
    ensure_not_blank, ensure_single_row, ensure_valid_id, LogStore, Repository, SeverityStore,
    StoreError, StoreResult, MISSING_SEVERITY_ID,
};
use crate::config::DatabaseConfig;
use crate::models::{Log, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct SeverityRow {
    id: i64,
    name: String,
    description: String,
}

impl From<SeverityRow> for Severity {
    fn from(row: SeverityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: String,
    timestamp: i64,
    message: String,
    severity_id: Option<i64>,
}

impl TryFrom<LogRow> for Log {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StoreError::InvalidRow(format!("log id {}: {}", row.id, e)))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp).ok_or_else(|| {
            StoreError::InvalidRow(format!("log {} timestamp {} out of range", id, row.timestamp))
        })?;

        Ok(Self {
            id,
            timestamp,
            message: row.message,
            severity_id: row.severity_id,
        })
    }
}

fn into_logs(rows: Vec<LogRow>) -> StoreResult<Vec<Log>> {
    rows.into_iter().map(Log::try_from).collect()
}

/// Pooled SQLite storage for both entities
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the pool described by `config` and run pending migrations
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

        // Every connection to :memory: is a separate database
        if is_in_memory(&config.url) {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations first
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("Storage migrations completed");
        Ok(Self { pool })
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl Repository<Severity> for SqliteStore {
    async fn get(&self, id: i64) -> StoreResult<Option<Severity>> {
        ensure_valid_id::<Severity>(&id)?;

        let row = sqlx::query_as::<_, SeverityRow>(
            "SELECT id, name, description FROM severities WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Severity::from))
    }

    async fn get_all(&self) -> StoreResult<Vec<Severity>> {
        let rows = sqlx::query_as::<_, SeverityRow>(
            "SELECT id, name, description FROM severities ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Severity::from).collect())
    }

    async fn create(&self, severity: &Severity) -> StoreResult<i64> {
        ensure_not_blank(severity)?;

        let result = sqlx::query("INSERT INTO severities (name, description) VALUES (?, ?)")
            .bind(&severity.name)
            .bind(&severity.description)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, severity: &Severity) -> StoreResult<()> {
        ensure_valid_id::<Severity>(&severity.id)?;
        ensure_not_blank(severity)?;

        let result = sqlx::query("UPDATE severities SET name = ?, description = ? WHERE id = ?")
            .bind(&severity.name)
            .bind(&severity.description)
            .bind(severity.id)
            .execute(&self.pool)
            .await?;

        ensure_single_row("update severity", result.rows_affected())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        ensure_valid_id::<Severity>(&id)?;

        let result = sqlx::query("DELETE FROM severities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_single_row("delete severity", result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SeverityStore for SqliteStore {
    async fn get_name_by_id(&self, id: i64) -> StoreResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM severities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(name)
    }

    async fn get_id_by_name(&self, name: &str) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM severities WHERE name = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.unwrap_or(MISSING_SEVERITY_ID))
    }

    async fn get_logs_for_severity(&self, id: i64) -> StoreResult<Vec<Log>> {
        ensure_valid_id::<Severity>(&id)?;

        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, timestamp, message, severity_id
            FROM logs
            WHERE severity_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        into_logs(rows)
    }
}

#[async_trait]
impl Repository<Log> for SqliteStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Log>> {
        ensure_valid_id::<Log>(&id)?;

        let row = sqlx::query_as::<_, LogRow>(
            "SELECT id, timestamp, message, severity_id FROM logs WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Log::try_from).transpose()
    }

    async fn get_all(&self) -> StoreResult<Vec<Log>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT id, timestamp, message, severity_id FROM logs ORDER BY timestamp ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        into_logs(rows)
    }

    async fn create(&self, log: &Log) -> StoreResult<Uuid> {
        ensure_not_blank(log)?;

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO logs (id, timestamp, message, severity_id) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(log.timestamp.timestamp_millis())
            .bind(&log.message)
            .bind(log.severity_id)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn update(&self, log: &Log) -> StoreResult<()> {
        ensure_valid_id::<Log>(&log.id)?;
        ensure_not_blank(log)?;

        let result = sqlx::query(
            "UPDATE logs SET timestamp = ?, message = ?, severity_id = ? WHERE id = ?",
        )
        .bind(log.timestamp.timestamp_millis())
        .bind(&log.message)
        .bind(log.severity_id)
        .bind(log.id.to_string())
        .execute(&self.pool)
        .await?;

        ensure_single_row("update log", result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        ensure_valid_id::<Log>(&id)?;

        let result = sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        ensure_single_row("delete log", result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LogStore for SqliteStore {
    async fn get_severity_of(&self, id: Uuid) -> StoreResult<Option<Severity>> {
        ensure_valid_id::<Log>(&id)?;

        let row = sqlx::query_as::<_, SeverityRow>(
            r#"
            SELECT s.id, s.name, s.description
            FROM logs l
            JOIN severities s ON s.id = l.severity_id
            WHERE l.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Severity::from))
    }
}
