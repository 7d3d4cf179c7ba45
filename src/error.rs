use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error on logging service.";
pub const INTERNAL_ERROR_DETAILS: &str = "Ensure that request was correct.";

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Malformed id, invalid body or failed validation
    BadRequest { message: String, details: String },
    /// Entity absent
    NotFound { message: String, details: String },
    /// Persistence failure, including unexpected affected-row counts
    Store(StoreError),
    /// Any other failure the client cannot fix
    Internal(String),
    /// Temporary overload, e.g. the ingestion queue is full
    ServiceUnavailable { message: String, details: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a redelivery of the same input could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(StoreError::InvalidArgument(_)) => false,
            Self::Store(_) | Self::Internal(_) | Self::ServiceUnavailable { .. } => true,
            Self::BadRequest { .. } | Self::NotFound { .. } => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest { message, details } => {
                write!(f, "Bad request: {} {}", message, details)
            }
            Self::NotFound { message, details } => write!(f, "Not found: {} {}", message, details),
            Self::Store(err) => write!(f, "Storage error: {}", err),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
            Self::ServiceUnavailable { message, details } => {
                write!(f, "Service unavailable: {} {}", message, details)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub status_code: u16,
    pub message: String,
    pub details: String,
}

impl ErrorDetails {
    pub fn new(status: StatusCode, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_MESSAGE,
            INTERNAL_ERROR_DETAILS,
        )
    }
}

impl IntoResponse for ErrorDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Underlying failure text of a 500, attached as a response extension so the
/// error pipeline can expose it in development
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::BadRequest { message, details }
            | Self::NotFound { message, details }
            | Self::ServiceUnavailable { message, details } => {
                ErrorDetails::new(status, message, details).into_response()
            }
            Self::Store(_) | Self::Internal(_) => {
                tracing::error!(
                    error = %self,
                    error_type = error_type_name(&self),
                    "Request failed with internal error"
                );
                let mut response = ErrorDetails::internal().into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail(self.to_string()));
                response
            }
        }
    }
}

pub fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::BadRequest { .. } => "bad_request",
        AppError::NotFound { .. } => "not_found",
        AppError::Store(StoreError::RowsAffected { .. }) => "rows_affected",
        AppError::Store(_) => "store_error",
        AppError::Internal(_) => "internal_error",
        AppError::ServiceUnavailable { .. } => "service_unavailable",
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
