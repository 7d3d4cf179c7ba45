//! Request and response bodies for the HTTP API
//!
//! Request fields are optional so that missing and `null` values reach the
//! validation layer instead of failing inside the JSON extractor.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// POST /logs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogRequest {
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub message: Option<String>,
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub severity_name: Option<String>,
}

/// PUT /logs/:id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogRequest {
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub message: Option<String>,
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub severity_name: Option<String>,
}

/// POST /severities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateSeverityRequest {
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub name: Option<String>,
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub description: Option<String>,
}

/// PUT /severities/:id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateSeverityRequest {
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub name: Option<String>,
    #[validate(required, custom(function = "crate::validation::not_blank"))]
    pub description: Option<String>,
}

/// Body of a 201 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse<T> {
    pub id: T,
}
