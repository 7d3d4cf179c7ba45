use super::{ensure_valid, store_error, INVALID_CREATION_DTO, INVALID_UPDATION_DTO};
use crate::error::AppError;
use crate::metrics::{self, LogSource};
use crate::models::{CreateLogRequest, Log, LogRecord, UpdateLogRequest};
use crate::storage::{LogStore, SeverityStore, Storage, MISSING_SEVERITY_ID};
use crate::validation::ValidateRequest;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Parse a log id from a path segment
pub fn parse_log_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AppError::bad_request(
            "Id isn't valid.",
            "Searchable log cannot be found because id isn't valid.",
        )
    })
}

fn ensure_log_id(id: &Uuid) -> Result<(), AppError> {
    if id.is_nil() {
        Err(AppError::bad_request(
            "Id is empty.",
            "Searchable log cannot be found because id is empty.",
        ))
    } else {
        Ok(())
    }
}

fn log_not_found() -> AppError {
    AppError::not_found("Log not found.", "Cannot find log with given id.")
}

/// Orchestrates log reads and writes over the configured storage
#[derive(Clone)]
pub struct LogService {
    logs: Arc<dyn LogStore>,
    severities: Arc<dyn SeverityStore>,
}

impl LogService {
    pub fn new(storage: &Storage) -> Self {
        Self {
            logs: storage.logs.clone(),
            severities: storage.severities.clone(),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<LogRecord, AppError> {
        ensure_log_id(&id)?;

        let log = self
            .logs
            .get(id)
            .await
            .map_err(store_error("get log"))?
            .ok_or_else(log_not_found)?;

        let severity_name = match log.severity_id {
            Some(severity_id) => self
                .severities
                .get_name_by_id(severity_id)
                .await
                .map_err(store_error("get severity name"))?,
            None => None,
        };

        Ok(LogRecord::from_log(log, severity_name))
    }

    pub async fn get_all(&self) -> Result<Vec<LogRecord>, AppError> {
        let logs = self.logs.get_all().await.map_err(store_error("list logs"))?;
        let names: HashMap<i64, String> = self
            .severities
            .get_all()
            .await
            .map_err(store_error("list severities"))?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        Ok(logs
            .into_iter()
            .map(|log| {
                let name = log.severity_id.and_then(|id| names.get(&id).cloned());
                LogRecord::from_log(log, name)
            })
            .collect())
    }

    pub async fn create(&self, request: CreateLogRequest) -> Result<Uuid, AppError> {
        ensure_valid(request.validate_request(), INVALID_CREATION_DTO)?;

        let message = request.message.unwrap_or_default();
        let severity_name = request.severity_name.unwrap_or_default();
        self.write_log(&message, &severity_name, LogSource::Http).await
    }

    /// Write path shared by `POST /logs` and the ingestion consumer
    ///
    /// Stamps the current UTC time and resolves the severity by name.
    pub async fn write_log(
        &self,
        message: &str,
        severity_name: &str,
        source: LogSource,
    ) -> Result<Uuid, AppError> {
        let severity_id = self.resolve_severity(severity_name).await?;

        let log = Log::new(message, severity_id);
        let id = self
            .logs
            .create(&log)
            .await
            .map_err(store_error("create log"))?;

        metrics::record_log_written(source);
        tracing::info!(
            log_id = %id,
            severity_id,
            source = source.as_str(),
            "Log created"
        );

        Ok(id)
    }

    pub async fn update(&self, id: Uuid, request: UpdateLogRequest) -> Result<(), AppError> {
        ensure_valid(request.validate_request(), INVALID_UPDATION_DTO)?;
        ensure_log_id(&id)?;

        let mut log = self
            .logs
            .get(id)
            .await
            .map_err(store_error("get log"))?
            .ok_or_else(log_not_found)?;

        let severity_id = self
            .resolve_severity(request.severity_name.as_deref().unwrap_or_default())
            .await?;
        if log.severity_id != Some(severity_id) {
            tracing::debug!(
                log_id = %id,
                previous = ?log.severity_id,
                severity_id,
                "Changing log severity"
            );
            log.severity_id = Some(severity_id);
        }
        log.message = request.message.unwrap_or_default();

        self.logs
            .update(&log)
            .await
            .map_err(store_error("update log"))?;

        tracing::info!(log_id = %id, "Log updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        ensure_log_id(&id)?;

        self.logs
            .get(id)
            .await
            .map_err(store_error("get log"))?
            .ok_or_else(log_not_found)?;

        self.logs
            .delete(id)
            .await
            .map_err(store_error("delete log"))?;

        tracing::info!(log_id = %id, "Log deleted");
        Ok(())
    }

    async fn resolve_severity(&self, name: &str) -> Result<i64, AppError> {
        let id = self
            .severities
            .get_id_by_name(name)
            .await
            .map_err(store_error("resolve severity"))?;

        if id == MISSING_SEVERITY_ID {
            tracing::warn!(severity_name = name, "Unknown severity name");
            return Err(AppError::bad_request(
                "Severity not found.",
                "Cannot find severity with given name.",
            ));
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    async fn create_test_service() -> (LogService, Storage) {
        let storage = Storage::memory();
        for (name, description) in [("Error", "Something failed"), ("Info", "Routine event")] {
            storage
                .severities
                .create(&Severity::new(name, description))
                .await
                .unwrap();
        }
        (LogService::new(&storage), storage)
    }

    fn create_request(message: &str, severity: &str) -> CreateLogRequest {
        CreateLogRequest {
            message: Some(message.to_string()),
            severity_name: Some(severity.to_string()),
        }
    }

    fn assert_bad_request(err: AppError, expected_message: &str) -> String {
        match err {
            AppError::BadRequest { message, details } => {
                assert_eq!(message, expected_message);
                details
            }
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_log_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_log_id(&id.to_string()).unwrap(), id);

        let err = parse_log_id("not-a-guid").unwrap_err();
        assert_bad_request(err, "Id isn't valid.");
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (service, _) = create_test_service().await;

        let id = service.create(create_request("disk full", "Error")).await.unwrap();
        assert!(!id.is_nil());

        let record = service.get(id).await.unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.message, "disk full");
        assert_eq!(record.severity_name.as_deref(), Some("Error"));
    }

    #[tokio::test]
    async fn test_invalid_create_does_not_persist() {
        let (service, storage) = create_test_service().await;

        let err = service.create(CreateLogRequest::default()).await.unwrap_err();
        let details = assert_bad_request(err, INVALID_CREATION_DTO);
        assert_eq!(
            details,
            "'Message' must not be empty.\n'Severity Name' must not be empty."
        );
        assert!(storage.logs.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_severity_rejected() {
        let (service, storage) = create_test_service().await;

        let err = service
            .create(create_request("disk full", "Fatal"))
            .await
            .unwrap_err();
        let details = assert_bad_request(err, "Severity not found.");
        assert_eq!(details, "Cannot find severity with given name.");
        assert!(storage.logs.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_nil_and_missing_ids() {
        let (service, _) = create_test_service().await;

        let err = service.get(Uuid::nil()).await.unwrap_err();
        assert_bad_request(err, "Id is empty.");

        match service.get(Uuid::new_v4()).await.unwrap_err() {
            AppError::NotFound { message, details } => {
                assert_eq!(message, "Log not found.");
                assert_eq!(details, "Cannot find log with given id.");
            }
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_same_severity_only_changes_message() {
        let (service, storage) = create_test_service().await;
        let id = service.create(create_request("first", "Info")).await.unwrap();
        let before = storage.logs.get(id).await.unwrap().unwrap();

        service
            .update(
                id,
                UpdateLogRequest {
                    message: Some("second".to_string()),
                    severity_name: Some("Info".to_string()),
                },
            )
            .await
            .unwrap();

        let after = storage.logs.get(id).await.unwrap().unwrap();
        assert_eq!(after.message, "second");
        assert_eq!(after.severity_id, before.severity_id);
        assert_eq!(after.timestamp, before.timestamp);
    }

    #[tokio::test]
    async fn test_update_changes_severity() {
        let (service, _) = create_test_service().await;
        let id = service.create(create_request("first", "Info")).await.unwrap();

        service
            .update(
                id,
                UpdateLogRequest {
                    message: Some("escalated".to_string()),
                    severity_name: Some("Error".to_string()),
                },
            )
            .await
            .unwrap();

        let record = service.get(id).await.unwrap();
        assert_eq!(record.message, "escalated");
        assert_eq!(record.severity_name.as_deref(), Some("Error"));
    }

    #[tokio::test]
    async fn test_update_validates_before_checking_id() {
        let (service, _) = create_test_service().await;

        let err = service
            .update(Uuid::nil(), UpdateLogRequest::default())
            .await
            .unwrap_err();
        assert_bad_request(err, INVALID_UPDATION_DTO);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, _) = create_test_service().await;
        let id = service.create(create_request("temp", "Info")).await.unwrap();

        service.delete(id).await.unwrap();

        assert!(matches!(service.get(id).await, Err(AppError::NotFound { .. })));
        assert!(matches!(service.delete(id).await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_all_enriches_names() {
        let (service, storage) = create_test_service().await;
        service.create(create_request("one", "Error")).await.unwrap();
        service.create(create_request("two", "Info")).await.unwrap();

        let error_id = storage.severities.get_id_by_name("Error").await.unwrap();
        storage.severities.delete(error_id).await.unwrap();

        let records = service.get_all().await.unwrap();
        assert_eq!(records.len(), 2);

        let orphan = records.iter().find(|r| r.message == "one").unwrap();
        assert!(orphan.severity_name.is_none());
        let info = records.iter().find(|r| r.message == "two").unwrap();
        assert_eq!(info.severity_name.as_deref(), Some("Info"));
    }
}
