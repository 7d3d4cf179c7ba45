use super::{parse_body, BodyKind};
use crate::error::AppError;
use crate::ingestion::{CreateLogMessage, LogQueue, QueueError};
use axum::{body::Bytes, extract::State, http::StatusCode};

/// POST /ingest/logs
///
/// Queues the message for the background consumer and returns immediately.
/// Mounted only when ingestion is enabled.
pub async fn publish_log(
    State(queue): State<LogQueue>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let message: CreateLogMessage = parse_body(&body, BodyKind::Creation)?;

    match queue.try_publish(message) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(QueueError::Full) => {
            tracing::warn!("Ingestion queue full, rejecting message");
            Err(AppError::service_unavailable(
                "Ingestion queue is full.",
                "Retry the request later.",
            ))
        }
        Err(QueueError::Closed) => Err(AppError::Internal(
            "Ingestion worker is not running".to_string(),
        )),
    }
}
