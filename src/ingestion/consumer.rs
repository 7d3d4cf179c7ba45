use super::queue::MessageHandler;
use crate::error::AppError;
use crate::metrics::LogSource;
use crate::services::LogService;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound request to create a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogMessage {
    pub message: String,
    pub severity_name: String,
}

/// Turns [`CreateLogMessage`]s into stored logs
///
/// Uses the same write path as `POST /logs` without request validation.
/// Failures are returned so the transport can decide on redelivery.
#[derive(Clone)]
pub struct CreateLogConsumer {
    logs: LogService,
}

impl CreateLogConsumer {
    pub fn new(logs: LogService) -> Self {
        Self { logs }
    }

    pub async fn consume(&self, message: &CreateLogMessage) -> Result<Uuid, AppError> {
        self.logs
            .write_log(&message.message, &message.severity_name, LogSource::Ingestion)
            .await
    }
}

#[async_trait]
impl MessageHandler for CreateLogConsumer {
    type Message = CreateLogMessage;

    async fn handle(&self, message: &CreateLogMessage) -> Result<(), AppError> {
        let id = self.consume(message).await?;
        tracing::debug!(log_id = %id, "Ingested log message");
        Ok(())
    }
}
