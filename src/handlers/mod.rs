pub mod health;
pub mod ingest;
pub mod logs;
pub mod metrics_handler;
pub mod severities;

use crate::error::AppError;
use crate::ingestion::LogQueue;
use crate::services::{LogService, SeverityService};
use crate::storage::Storage;
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Shared state for the API handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub logs: LogService,
    pub severities: SeverityService,
    /// `None` when ingestion is disabled
    pub ingestion: Option<LogQueue>,
}

impl AppState {
    pub fn new(storage: Storage, ingestion: Option<LogQueue>) -> Self {
        Self {
            logs: LogService::new(&storage),
            severities: SeverityService::new(&storage),
            storage,
            ingestion,
        }
    }
}

/// Which kind of request body is being read; selects the error wording
#[derive(Debug, Clone, Copy)]
pub(crate) enum BodyKind {
    Creation,
    Updation,
}

impl BodyKind {
    fn null_error(self) -> AppError {
        let kind = match self {
            Self::Creation => "creation",
            Self::Updation => "updation",
        };
        AppError::bad_request(
            format!("Incoming {} DTO model is null.", kind),
            format!("Incoming {} DTO model cannot be null.", kind),
        )
    }
}

/// Decode a JSON request body
///
/// An empty body and a literal `null` are both reported as a null model.
/// The Content-Type header is not checked.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes, kind: BodyKind) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(kind.null_error());
    }

    let value: Option<T> = serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request("Incoming request body isn't valid.", e.to_string()))?;

    value.ok_or_else(|| kind.null_error())
}
