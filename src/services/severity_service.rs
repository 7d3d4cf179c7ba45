use super::{ensure_valid, store_error, INVALID_CREATION_DTO, INVALID_UPDATION_DTO};
use crate::error::AppError;
use crate::models::{
    CreateSeverityRequest, LogRecord, Severity, SeverityRecord, UpdateSeverityRequest,
};
use crate::storage::{SeverityStore, Storage};
use crate::validation::ValidateRequest;
use std::sync::Arc;

fn invalid_severity_id() -> AppError {
    AppError::bad_request(
        "Id isn't valid.",
        "Searchable severity cannot be found because id isn't valid.",
    )
}

fn severity_not_found() -> AppError {
    AppError::not_found("Severity not found.", "Cannot find severity with given id.")
}

/// Parse a severity id from a path segment
pub fn parse_severity_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| invalid_severity_id())
}

fn ensure_severity_id(id: i64) -> Result<(), AppError> {
    if id > 0 {
        Ok(())
    } else {
        Err(invalid_severity_id())
    }
}

/// Orchestrates severity reads and writes
#[derive(Clone)]
pub struct SeverityService {
    severities: Arc<dyn SeverityStore>,
}

impl SeverityService {
    pub fn new(storage: &Storage) -> Self {
        Self {
            severities: storage.severities.clone(),
        }
    }

    pub async fn get(&self, id: i64) -> Result<SeverityRecord, AppError> {
        Ok(self.find(id).await?.into())
    }

    pub async fn get_all(&self) -> Result<Vec<SeverityRecord>, AppError> {
        let severities = self
            .severities
            .get_all()
            .await
            .map_err(store_error("list severities"))?;

        Ok(severities.into_iter().map(SeverityRecord::from).collect())
    }

    pub async fn create(&self, request: CreateSeverityRequest) -> Result<i64, AppError> {
        ensure_valid(request.validate_request(), INVALID_CREATION_DTO)?;

        let severity = Severity::new(
            request.name.unwrap_or_default(),
            request.description.unwrap_or_default(),
        );
        let id = self
            .severities
            .create(&severity)
            .await
            .map_err(store_error("create severity"))?;

        tracing::info!(severity_id = id, name = %severity.name, "Severity created");
        Ok(id)
    }

    /// Full replace of name and description
    pub async fn update(&self, id: i64, request: UpdateSeverityRequest) -> Result<(), AppError> {
        ensure_valid(request.validate_request(), INVALID_UPDATION_DTO)?;

        let mut severity = self.find(id).await?;
        severity.name = request.name.unwrap_or_default();
        severity.description = request.description.unwrap_or_default();

        self.severities
            .update(&severity)
            .await
            .map_err(store_error("update severity"))?;

        tracing::info!(severity_id = id, "Severity updated");
        Ok(())
    }

    /// Logs referencing the severity keep existing with no severity
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.find(id).await?;

        self.severities
            .delete(id)
            .await
            .map_err(store_error("delete severity"))?;

        tracing::info!(severity_id = id, "Severity deleted");
        Ok(())
    }

    pub async fn get_logs(&self, id: i64) -> Result<Vec<LogRecord>, AppError> {
        let severity = self.find(id).await?;

        let logs = self
            .severities
            .get_logs_for_severity(id)
            .await
            .map_err(store_error("list severity logs"))?;

        Ok(logs
            .into_iter()
            .map(|log| LogRecord::from_log(log, Some(severity.name.clone())))
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Severity, AppError> {
        ensure_severity_id(id)?;

        self.severities
            .get(id)
            .await
            .map_err(store_error("get severity"))?
            .ok_or_else(severity_not_found)
    }
}
