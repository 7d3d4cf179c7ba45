//! Presence validation for incoming request bodies
//!
//! Rules are declared on the request models with `validator`. Each property
//! reports at most one failure, and all properties are always checked so the
//! caller sees the complete list in declaration order.

use std::fmt;

use validator::{Validate, ValidationError};

use crate::models::{
    CreateLogRequest, CreateSeverityRequest, UpdateLogRequest, UpdateSeverityRequest,
};

/// One failed rule for one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub property: &'static str,
    pub message: String,
}

/// Outcome of validating a request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    failures: Vec<ValidationFailure>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.failures.iter().map(|f| f.message.as_str()).collect();
        write!(f, "{}", messages.join("\n"))
    }
}

/// Fails on an empty or whitespace-only value; `required` covers a missing one
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Implemented by every request body the API accepts
pub trait ValidateRequest: Validate {
    /// `(field, property name)` pairs in reporting order
    const PROPERTIES: &'static [(&'static str, &'static str)];

    fn validate_request(&self) -> ValidationResult {
        let errors = match self.validate() {
            Ok(()) => return ValidationResult::default(),
            Err(errors) => errors,
        };
        let field_errors = errors.field_errors();

        let failures = Self::PROPERTIES
            .iter()
            .filter(|(field, _)| field_errors.get(*field).is_some_and(|e| !e.is_empty()))
            .map(|&(_, property)| ValidationFailure {
                property,
                message: format!("'{}' must not be empty.", property),
            })
            .collect();

        ValidationResult { failures }
    }
}

impl ValidateRequest for CreateLogRequest {
    const PROPERTIES: &'static [(&'static str, &'static str)] =
        &[("message", "Message"), ("severity_name", "Severity Name")];
}

impl ValidateRequest for UpdateLogRequest {
    const PROPERTIES: &'static [(&'static str, &'static str)] =
        &[("message", "Message"), ("severity_name", "Severity Name")];
}

impl ValidateRequest for CreateSeverityRequest {
    const PROPERTIES: &'static [(&'static str, &'static str)] =
        &[("name", "Name"), ("description", "Description")];
}

impl ValidateRequest for UpdateSeverityRequest {
    const PROPERTIES: &'static [(&'static str, &'static str)] =
        &[("name", "Name"), ("description", "Description")];
}
