//! Request orchestration
//!
//! Each operation runs validate → resolve → persist strictly in order and
//! stops at the first failure. Input and not-found failures become
//! [`AppError::BadRequest`] / [`AppError::NotFound`] here; storage failures
//! propagate as [`AppError::Store`].

pub mod log_service;
pub mod severity_service;

pub use log_service::LogService;
pub use severity_service::SeverityService;

use crate::error::AppError;
use crate::metrics;
use crate::storage::StoreError;
use crate::validation::ValidationResult;

/// Count a storage failure under `operation` and wrap it
pub(crate) fn store_error(operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| {
        metrics::record_store_error(operation);
        tracing::warn!(operation, error = %err, "Storage operation failed");
        AppError::Store(err)
    }
}

pub(crate) fn ensure_valid(result: ValidationResult, message: &str) -> Result<(), AppError> {
    if result.is_valid() {
        Ok(())
    } else {
        Err(AppError::bad_request(message, result.to_string()))
    }
}

pub(crate) const INVALID_CREATION_DTO: &str = "Incoming creation DTO model isn't valid.";
pub(crate) const INVALID_UPDATION_DTO: &str = "Incoming updation DTO model isn't valid.";
